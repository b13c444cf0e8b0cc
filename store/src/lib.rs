//! Atomic per-epoch persistence, cross-epoch map merge, and the verifier
//!.

pub mod map;
pub mod persist;
pub mod verify;

pub use map::merge_epoch_map;
pub use persist::{epoch_dir, persist_epoch};
pub use verify::{verify_epoch_dir, BatchVerifyResult, VerifyReport};
