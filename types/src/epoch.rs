//! `EpochResult` and the persisted `superRoot.json` record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::params::HGCParams;
use crate::sample::Entry;

/// The in-memory output of compressing a single epoch, before persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpochResult {
    pub batches: Vec<Batch>,
    /// Leaf cell (canonical string) → `geoBatchId` (canonical string), for
    /// this epoch only. The cross-epoch map (`CrossEpochMap`) is built by
    /// merging this into persisted state.
    pub map: BTreeMap<String, String>,
    pub super_root: String,
    pub summary: SuperRootRecord,
    pub hgc_params: HGCParams,
    /// Samples rejected under `on_invalid = mark`.
    pub invalid_samples: Vec<geobatch_error::InvalidSample>,
}

/// Exact schema of `superRoot.json`: `{ epoch, superRoot,
/// batchIds, batchRoots, schemaVersion, hgcParams, meta, tsMin, tsMax,
/// batchesTotal, samplesTotal }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperRootRecord {
    pub epoch: u64,
    pub super_root: String,
    pub batch_ids: Vec<String>,
    pub batch_roots: Vec<String>,
    pub schema_version: u32,
    pub hgc_params: HGCParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    pub ts_min: Option<i64>,
    pub ts_max: Option<i64>,
    pub batches_total: usize,
    pub samples_total: u64,
}

/// The persistent, append-only cross-epoch mapping: outer key epoch number, inner key cell id, value
/// `geoBatchId`, both ascending by construction via `BTreeMap`.
pub type CrossEpochMap = BTreeMap<u64, BTreeMap<String, String>>;

/// A validated sample paired with the cell it normalizes to, produced by
/// the validator/deduplicator stage and consumed by the cell
/// aggregator.
#[derive(Clone, Debug)]
pub struct NormalizedSample {
    pub cell: crate::cell::CellId,
    pub entry: Entry,
    pub dedup_key: String,
}
