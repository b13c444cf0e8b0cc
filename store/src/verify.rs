//! Verifier: recomputes every batch's Merkle root and hash,
//! and the epoch's super-root, from the persisted files alone.

use std::fs;
use std::path::Path;

use geobatch_error::GeoBatchError;
use geobatch_hash::{canonical, hex_bytes, hex_string, merkle_root_for_data, sha256_hex, super_root};
use geobatch_types::{Batch, SuperRootRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchVerifyResult {
    pub geo_batch_id: String,
    pub hash_ok: bool,
    pub merkle_ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub batches: Vec<BatchVerifyResult>,
    pub super_root_ok: bool,
}

impl VerifyReport {
    pub fn is_sound(&self) -> bool {
        self.super_root_ok && self.batches.iter().all(|b| b.hash_ok && b.merkle_ok)
    }
}

/// Loads every `*.json` batch file (everything but `superRoot.json`) from
/// `epoch_dir` and cross-checks hashes and the super-root.
pub fn verify_epoch_dir(epoch_dir: &Path) -> Result<VerifyReport, GeoBatchError> {
    let summary_path = epoch_dir.join("superRoot.json");
    let summary_bytes = fs::read(&summary_path).map_err(|e| GeoBatchError::io(&summary_path, e))?;
    let summary: SuperRootRecord =
        serde_json::from_slice(&summary_bytes).map_err(|e| GeoBatchError::encode(e.to_string()))?;

    let mut batches = Vec::new();
    for entry in fs::read_dir(epoch_dir).map_err(|e| GeoBatchError::io(epoch_dir, e))? {
        let entry = entry.map_err(|e| GeoBatchError::io(epoch_dir, e))?;
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some("superRoot.json") {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let bytes = fs::read(&path).map_err(|e| GeoBatchError::io(&path, e))?;
        let batch: Batch =
            serde_json::from_slice(&bytes).map_err(|e| GeoBatchError::encode(e.to_string()))?;
        batches.push(verify_batch(&batch)?);
    }

    batches.sort_by(|a: &(Batch, BatchVerifyResult), b| a.0.geo_batch_id.cmp(&b.0.geo_batch_id));

    let mut pairs = Vec::with_capacity(batches.len());
    for (batch, _) in &batches {
        let mut root = [0u8; 32];
        let decoded = hex_bytes(&batch.merkle_root)
            .map_err(|e| GeoBatchError::encode(format!("bad merkle root hex: {e}")))?;
        if decoded.len() == 32 {
            root.copy_from_slice(&decoded);
        }
        pairs.push((batch.geo_batch_id.clone(), root));
    }
    let recomputed_super_root = hex_string(&super_root(&pairs));
    let recomputed_batch_roots: Vec<String> =
        batches.iter().map(|(b, _)| b.merkle_root.clone()).collect();
    let super_root_ok = recomputed_super_root == summary.super_root
        && batches.iter().map(|(b, _)| b.geo_batch_id.clone()).collect::<Vec<_>>()
            == summary.batch_ids
        && recomputed_batch_roots == summary.batch_roots;

    let report = VerifyReport {
        batches: batches.into_iter().map(|(_, r)| r).collect(),
        super_root_ok,
    };
    tracing::debug!(
        epoch = summary.epoch,
        sound = report.is_sound(),
        batches = report.batches.len(),
        "verify_epoch_dir: complete"
    );
    Ok(report)
}

fn verify_batch(batch: &Batch) -> Result<(Batch, BatchVerifyResult), GeoBatchError> {
    let recomputed_hash = sha256_hex(&canonical(&batch.without_hash())?);
    let hash_ok = recomputed_hash == batch.hash;

    let merkle = merkle_root_for_data(&batch.data)?;
    let merkle_ok = hex_string(&merkle.root) == batch.merkle_root
        && merkle.leaves_index == batch.leaves_index;

    Ok((
        batch.clone(),
        BatchVerifyResult {
            geo_batch_id: batch.geo_batch_id.clone(),
            hash_ok,
            merkle_ok,
        },
    ))
}
