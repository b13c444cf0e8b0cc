//! A local JSONL stand-in for the on-chain registry.

use std::path::PathBuf;

use async_trait::async_trait;
use geobatch_error::GeoBatchError;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::RegistrySink;

#[derive(Serialize)]
struct RegistryRecord<'a> {
    epoch: u64,
    geo_batch_id: &'a str,
    merkle_root: &'a str,
    cid: &'a str,
}

/// Appends one JSON line per registered batch to `path`. Writes are
/// serialized through a mutex since `tokio::fs` gives no append-atomicity
/// guarantee across concurrent callers within one process.
pub struct MockRegistrySink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MockRegistrySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl RegistrySink for MockRegistrySink {
    async fn register_batch(
        &self,
        epoch: u64,
        geo_batch_id: &str,
        merkle_root: &str,
        cid: &str,
    ) -> Result<(), GeoBatchError> {
        tracing::debug!(epoch, geo_batch_id, "register_batch: entry");
        let record = RegistryRecord {
            epoch,
            geo_batch_id,
            merkle_root,
            cid,
        };
        let mut line =
            serde_json::to_vec(&record).map_err(|e| GeoBatchError::encode(e.to_string()))?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| GeoBatchError::io(&self.path, e))?;
        file.write_all(&line)
            .await
            .map_err(|e| GeoBatchError::io(&self.path, e))?;
        tracing::info!(epoch, geo_batch_id, cid, "register_batch: complete");
        Ok(())
    }
}
