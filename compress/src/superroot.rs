//! Epoch super-root builder.

use geobatch_error::GeoBatchError;
use geobatch_hash::{hex_bytes, hex_string, super_root};
use geobatch_types::{Batch, HGCParams, SuperRootRecord, SCHEMA_VERSION};

/// Builds the epoch super-root and its `superRoot.json` summary from
/// `batches`. Batches are sorted by `geoBatchId` before hashing, so the
/// result does not depend on the order batches were produced in.
pub fn build_super_root(
    batches: &[Batch],
    epoch: u64,
    params: &HGCParams,
) -> Result<(String, SuperRootRecord), GeoBatchError> {
    let mut sorted: Vec<&Batch> = batches.iter().collect();
    sorted.sort_by(|a, b| a.geo_batch_id.cmp(&b.geo_batch_id));

    let mut pairs = Vec::with_capacity(sorted.len());
    for batch in &sorted {
        let root_bytes = hex_bytes(&batch.merkle_root)
            .map_err(|e| GeoBatchError::encode(format!("bad merkle root hex: {e}")))?;
        let mut root = [0u8; 32];
        if root_bytes.len() != 32 {
            return Err(GeoBatchError::encode("merkle root is not 32 bytes"));
        }
        root.copy_from_slice(&root_bytes);
        pairs.push((batch.geo_batch_id.clone(), root));
    }

    let root = super_root(&pairs);
    let super_root_hex = hex_string(&root);

    let ts_min = sorted.iter().filter_map(|b| b.ts_min).min();
    let ts_max = sorted.iter().filter_map(|b| b.ts_max).max();
    let samples_total: u64 = sorted.iter().map(|b| b.count_samples).sum();

    let record = SuperRootRecord {
        epoch,
        super_root: super_root_hex.clone(),
        batch_ids: sorted.iter().map(|b| b.geo_batch_id.clone()).collect(),
        batch_roots: sorted.iter().map(|b| b.merkle_root.clone()).collect(),
        schema_version: SCHEMA_VERSION,
        hgc_params: *params,
        meta: None,
        ts_min,
        ts_max,
        batches_total: sorted.len(),
        samples_total,
    };

    Ok((super_root_hex, record))
}
