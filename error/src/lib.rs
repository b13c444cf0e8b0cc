//! Error taxonomy shared across the geobatch pipeline.
//!
//! Mirrors `ckb_error`'s kind-plus-context shape (one variant per failure
//! domain, each carrying the context a caller needs to report a useful
//! message) but built on `thiserror` rather than the legacy `failure` crate.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A sample rejected during validation, retained when `on_invalid = mark`.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidSample {
    pub cell: String,
    pub field: String,
    pub reason: String,
}

/// Every failure domain a pipeline run can surface.
///
/// Policy: any non-validation error aborts the run before any
/// persisted file is finalized. Validation errors are governed by
/// `on_invalid` and never reach this enum in `mark`/`discard` mode.
#[derive(Debug, Error)]
pub enum GeoBatchError {
    /// Invalid cell id or out-of-range sensor reading, `on_invalid = throw`.
    #[error("validation failed for cell {cell}: {reason}")]
    Validation { cell: String, reason: String },

    /// The hex grid oracle rejected a lookup (unknown cell, bad resolution).
    #[error("hierarchy oracle rejected lookup: {0}")]
    Hierarchy(String),

    /// A value could not be canonically encoded (non-finite float, or
    /// otherwise non-serializable input).
    #[error("canonical encoding failed: {0}")]
    Encode(String),

    /// Cross-epoch map merge found the same cell already assigned to a
    /// different batch in the same epoch.
    #[error("cell map conflict for {cell}: existing batch {existing}, new batch {new}")]
    CellMapConflict {
        cell: String,
        existing: String,
        new: String,
    },

    /// The cross-epoch map's advisory lock was already held by another run.
    #[error("concurrent merge detected on {path}")]
    ConcurrentMerge { path: PathBuf },

    /// Filesystem or sink I/O failure.
    #[error("io error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Malformed parameters, e.g. `min_res > base_res`.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GeoBatchError>;

impl GeoBatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn hierarchy(reason: impl Into<String>) -> Self {
        Self::Hierarchy(reason.into())
    }

    pub fn encode(reason: impl Into<String>) -> Self {
        Self::Encode(reason.into())
    }

    /// Every kind maps to the same process exit code: 0 on
    /// success is the absence of an error, 1 on any error reaching here.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<std::io::Error> for GeoBatchError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_exits_nonzero() {
        let errs = vec![
            GeoBatchError::Validation {
                cell: "c0".into(),
                reason: "pm25 out of range".into(),
            },
            GeoBatchError::Hierarchy("unknown cell".into()),
            GeoBatchError::Encode("cycle detected".into()),
            GeoBatchError::CellMapConflict {
                cell: "c0".into(),
                existing: "p1".into(),
                new: "p2".into(),
            },
            GeoBatchError::ConcurrentMerge {
                path: PathBuf::from("/tmp/map.json"),
            },
            GeoBatchError::Config("min_res > base_res".into()),
        ];
        for err in errs {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn io_conversion_carries_no_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GeoBatchError = io_err.into();
        assert!(matches!(err, GeoBatchError::Io { path: None, .. }));
    }
}
