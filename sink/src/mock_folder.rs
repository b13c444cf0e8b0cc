//! A local-disk stand-in for a content-addressed folder sink.

use std::path::Path;

use async_trait::async_trait;
use geobatch_error::GeoBatchError;
use geobatch_hash::sha256_hex;

use crate::{Cid, FolderSink};

/// Computes a folder's content hash:
/// `sha256Hex` of the sorted `"{sha256Hex(file)}:{relPath}"` pairs for
/// every regular file under `path`, joined with `'|'`.
pub fn folder_content_hash(path: &Path) -> Result<String, GeoBatchError> {
    let mut pairs = Vec::new();
    collect(path, path, &mut pairs)?;
    pairs.sort();
    let joined = pairs.join("|");
    Ok(sha256_hex(joined.as_bytes()))
}

fn collect(root: &Path, dir: &Path, pairs: &mut Vec<String>) -> Result<(), GeoBatchError> {
    for entry in std::fs::read_dir(dir).map_err(|e| GeoBatchError::io(dir, e))? {
        let entry = entry.map_err(|e| GeoBatchError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, pairs)?;
            continue;
        }
        let bytes = std::fs::read(&path).map_err(|e| GeoBatchError::io(&path, e))?;
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        pairs.push(format!("{}:{}", sha256_hex(&bytes), rel_path));
    }
    Ok(())
}

/// Stores each folder's content locally (keyed by its own content hash)
/// instead of uploading anywhere, so pipeline tests don't need network
/// access.
pub struct MockFolderSink {
    store_dir: std::path::PathBuf,
}

impl MockFolderSink {
    pub fn new(store_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }
}

#[async_trait]
impl FolderSink for MockFolderSink {
    async fn upload_folder(&self, path: &Path) -> Result<Cid, GeoBatchError> {
        tracing::debug!(path = %path.display(), "upload_folder: entry");
        let cid = folder_content_hash(path)?;
        let dest = self.store_dir.join(&cid);
        tokio::fs::create_dir_all(&self.store_dir)
            .await
            .map_err(|e| GeoBatchError::io(&self.store_dir, e))?;
        if !dest.exists() {
            copy_dir(path, &dest).map_err(|e| GeoBatchError::io(&dest, e))?;
        }
        tracing::info!(%cid, "upload_folder: complete");
        Ok(cid)
    }
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &dest)?;
        } else {
            std::fs::copy(&path, &dest)?;
        }
    }
    Ok(())
}
