//! Cross-epoch map merge: appends one epoch's leaf→batch
//! mapping into the persisted, append-only `cellToBatchMap.json`, guarded by
//! an advisory exclusive lock so two concurrent runs never interleave
//! writes.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use fs2::FileExt;
use geobatch_error::GeoBatchError;
use geobatch_hash::{canonical, sha256_hex};
use geobatch_types::CrossEpochMap;

/// Merges `epoch_map` (this epoch's leaf cell → `geoBatchId` mapping) into
/// `<base>/data/cellToBatchMap.json`. Returns `ConcurrentMergeError` if
/// another process already holds the lock, and `CellMapConflict` if the
/// same cell is already assigned to a different batch within the same
/// epoch (a rerun with a changed compression outcome, which should never
/// happen for a deterministic pipeline but is checked defensively on the
/// merge path).
pub fn merge_epoch_map(
    base: &Path,
    epoch: u64,
    epoch_map: &BTreeMap<String, String>,
) -> Result<(), GeoBatchError> {
    let data_dir = base.join("data");
    fs::create_dir_all(&data_dir).map_err(|e| GeoBatchError::io(&data_dir, e))?;
    let path = data_dir.join("cellToBatchMap.json");
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .map_err(|e| GeoBatchError::io(&path, e))?;

    try_lock(&file, &path)?;
    let result = merge_locked(&mut file, &path, epoch, epoch_map);
    let _ = file.unlock();
    result
}

fn try_lock(file: &File, path: &Path) -> Result<(), GeoBatchError> {
    match file.try_lock_exclusive() {
        Ok(()) => Ok(()),
        Err(_) => Err(GeoBatchError::ConcurrentMerge {
            path: path.to_path_buf(),
        }),
    }
}

fn merge_locked(
    file: &mut File,
    path: &Path,
    epoch: u64,
    epoch_map: &BTreeMap<String, String>,
) -> Result<(), GeoBatchError> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| GeoBatchError::io(path, e))?;

    let mut cross_map: CrossEpochMap = if contents.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str(&contents).map_err(|e| GeoBatchError::encode(e.to_string()))?
    };

    let existing = cross_map.entry(epoch).or_default();
    for (cell, batch_id) in epoch_map {
        match existing.get(cell) {
            Some(prior) if prior != batch_id => {
                return Err(GeoBatchError::CellMapConflict {
                    cell: cell.clone(),
                    existing: prior.clone(),
                    new: batch_id.clone(),
                })
            }
            _ => {
                existing.insert(cell.clone(), batch_id.clone());
            }
        }
    }

    let bytes =
        serde_json::to_vec_pretty(&cross_map).map_err(|e| GeoBatchError::encode(e.to_string()))?;

    // Stage the merged map in the same directory and rename over the
    // target, the write-to-temp-then-rename discipline `persist.rs` uses
    // for epoch directories: a crash mid-write never leaves a truncated
    // or partially overwritten `cellToBatchMap.json` in place.
    let data_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(data_dir)
        .map_err(|e| GeoBatchError::io(data_dir, e))?;
    staged
        .write_all(&bytes)
        .map_err(|e| GeoBatchError::io(path, e))?;
    staged
        .persist(path)
        .map_err(|e| GeoBatchError::io(path, e.error))?;

    let content_hash = sha256_hex(&canonical(&cross_map)?);
    tracing::info!(epoch, %content_hash, "cross-epoch map merged");
    Ok(())
}
