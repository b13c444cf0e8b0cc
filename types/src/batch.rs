//! `Batch`: one emitted geoBatch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::HGCParams;
use crate::sample::Entry;

/// A geographic point, `[lat, lng]`.
pub type Point = [f64; 2];

/// Exact JSON keys: `geoBatchId, epoch, compressedFrom, data,
/// countLeaves, countSamples, tsMin, tsMax, center, boundary, resBase,
/// resBatch, epochStartMs, windowMs, schemaVersion, hgcParams, merkleRoot,
/// leavesIndex, hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub geo_batch_id: String,
    pub epoch: u64,
    pub compressed_from: Vec<String>,
    pub data: BTreeMap<String, Vec<Entry>>,
    pub count_leaves: u32,
    pub count_samples: u64,
    pub ts_min: Option<i64>,
    pub ts_max: Option<i64>,
    pub center: Point,
    pub boundary: Vec<Point>,
    pub res_base: u8,
    pub res_batch: u8,
    pub epoch_start_ms: i64,
    pub window_ms: i64,
    pub schema_version: u32,
    pub hgc_params: HGCParams,
    pub merkle_root: String,
    pub leaves_index: BTreeMap<String, usize>,
    pub hash: String,
}

impl Batch {
    /// The canonical record used for hashing and re-verification: every
    /// field except `hash` itself.
    pub fn without_hash(&self) -> BatchWithoutHash<'_> {
        BatchWithoutHash {
            geo_batch_id: &self.geo_batch_id,
            epoch: self.epoch,
            compressed_from: &self.compressed_from,
            data: &self.data,
            count_leaves: self.count_leaves,
            count_samples: self.count_samples,
            ts_min: self.ts_min,
            ts_max: self.ts_max,
            center: self.center,
            boundary: &self.boundary,
            res_base: self.res_base,
            res_batch: self.res_batch,
            epoch_start_ms: self.epoch_start_ms,
            window_ms: self.window_ms,
            schema_version: self.schema_version,
            hgc_params: self.hgc_params,
            merkle_root: &self.merkle_root,
            leaves_index: &self.leaves_index,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWithoutHash<'a> {
    pub geo_batch_id: &'a str,
    pub epoch: u64,
    pub compressed_from: &'a [String],
    pub data: &'a BTreeMap<String, Vec<Entry>>,
    pub count_leaves: u32,
    pub count_samples: u64,
    pub ts_min: Option<i64>,
    pub ts_max: Option<i64>,
    pub center: Point,
    pub boundary: &'a [Point],
    pub res_base: u8,
    pub res_batch: u8,
    pub epoch_start_ms: i64,
    pub window_ms: i64,
    pub schema_version: u32,
    pub hgc_params: HGCParams,
    pub merkle_root: &'a str,
    pub leaves_index: &'a BTreeMap<String, usize>,
}
