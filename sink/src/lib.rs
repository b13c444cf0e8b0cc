//! Sink traits: pluggable boundaries for shipping a persisted
//! epoch folder to content-addressed storage and announcing it to a
//! registry. Spec §1 keeps real implementations out of scope; only the
//! trait boundary plus a local mock on each side is built.

use std::path::Path;

use async_trait::async_trait;
use geobatch_error::GeoBatchError;

/// A content id returned by a folder sink, e.g. an IPFS CID in a real
/// deployment.
pub type Cid = String;

#[async_trait]
pub trait FolderSink: Send + Sync {
    async fn upload_folder(&self, path: &Path) -> Result<Cid, GeoBatchError>;
}

#[async_trait]
pub trait RegistrySink: Send + Sync {
    async fn register_batch(
        &self,
        epoch: u64,
        geo_batch_id: &str,
        merkle_root: &str,
        cid: &str,
    ) -> Result<(), GeoBatchError>;
}

mod mock_folder;
mod mock_registry;

pub use mock_folder::{folder_content_hash, MockFolderSink};
pub use mock_registry::MockRegistrySink;
