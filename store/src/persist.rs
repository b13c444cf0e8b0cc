//! Atomic per-epoch persistence.
//!
//! Each epoch's batch files and `superRoot.json` are written to a staging
//! directory under `<base>/data/` and renamed into place as a unit, the
//! same write-then-rename discipline the teacher's freezer files use
//! before calling `sync_all` and committing.

use std::fs;
use std::path::{Path, PathBuf};

use geobatch_error::GeoBatchError;
use geobatch_types::EpochResult;

/// Where one epoch's artifacts live once committed: `<base>/data/epoch_<E>/`.
pub fn epoch_dir(base: &Path, epoch: u64) -> PathBuf {
    base.join("data").join(format!("epoch_{epoch}"))
}

/// Writes `result`'s batches and super-root summary for `epoch` under
/// `base`, staging in a temp directory first so a crash mid-write never
/// leaves a partial epoch directory visible.
pub fn persist_epoch(base: &Path, epoch: u64, result: &EpochResult) -> Result<PathBuf, GeoBatchError> {
    let data_dir = base.join("data");
    fs::create_dir_all(&data_dir).map_err(|e| GeoBatchError::io(&data_dir, e))?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".tmp-epoch_{epoch}-"))
        .tempdir_in(&data_dir)
        .map_err(|e| GeoBatchError::io(&data_dir, e))?;

    for batch in &result.batches {
        let file_name = format!("{}.json", sanitize(&batch.geo_batch_id));
        let path = staging.path().join(file_name);
        let bytes = serde_json::to_vec_pretty(batch)
            .map_err(|e| GeoBatchError::encode(e.to_string()))?;
        fs::write(&path, bytes).map_err(|e| GeoBatchError::io(&path, e))?;
    }

    let summary_path = staging.path().join("superRoot.json");
    let summary_bytes = serde_json::to_vec_pretty(&result.summary)
        .map_err(|e| GeoBatchError::encode(e.to_string()))?;
    fs::write(&summary_path, summary_bytes).map_err(|e| GeoBatchError::io(&summary_path, e))?;

    let dest = epoch_dir(base, epoch);
    if dest.exists() {
        fs::remove_dir_all(&dest).map_err(|e| GeoBatchError::io(&dest, e))?;
    }
    let staging_path = staging.into_path();
    fs::rename(&staging_path, &dest).map_err(|e| GeoBatchError::io(&dest, e))?;

    tracing::info!(epoch, batches = result.batches.len(), dir = %dest.display(), "epoch persisted");
    Ok(dest)
}

/// `geoBatchId`s are already colon-delimited canonical strings; swap the
/// delimiter for a filesystem-friendly one.
fn sanitize(geo_batch_id: &str) -> String {
    geo_batch_id.replace(':', "-")
}
