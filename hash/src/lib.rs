//! Canonical encoding and Merkle tree building blocks.

mod canonical;
mod merkle;
mod sha256;

pub use canonical::{canonical, canonical_value};
pub use merkle::{keccak256, merkle_root_for_data, sorted_pair_root, super_root, DataMerkle};
pub use sha256::{hex_bytes, hex_string, sha256_hex};
