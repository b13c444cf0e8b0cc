//! Sorted-pair Merkle tree over keccak-256.
//!
//! Two hash functions are used in this pipeline and must never be unified:
//! keccak-256 here, for Merkle leaves and internal nodes; sha-256 (see
//! [`crate::sha256_hex`]) for canonical record hashes and folder content
//! hashes.

use std::collections::BTreeMap;

use geobatch_error::GeoBatchError;
use serde::Serialize;
use tiny_keccak::{Hasher, Keccak};

use crate::canonical::canonical;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Builds the sorted-pair binary tree over `leaves` in place. An odd node at
/// any level is promoted unchanged to the next level. A single leaf's "tree"
/// is that leaf itself.
pub fn sorted_pair_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            if pair.len() == 2 {
                let (lo, hi) = if pair[0] <= pair[1] {
                    (pair[0], pair[1])
                } else {
                    (pair[1], pair[0])
                };
                let mut buf = [0u8; 64];
                buf[..32].copy_from_slice(&lo);
                buf[32..].copy_from_slice(&hi);
                next.push(keccak256(&buf));
            } else {
                next.push(pair[0]);
            }
        }
        level = next;
    }
    level[0]
}

/// Result of building the per-batch Merkle tree over `data`.
pub struct DataMerkle {
    pub root: [u8; 32],
    /// Position of each cell key within the sorted leaf order.
    pub leaves_index: BTreeMap<String, usize>,
}

/// Builds the per-batch Merkle tree: leaves are
/// `keccak256(cell_key ‖ ':' ‖ canonical(entries))` over keys sorted by
/// code point, assembled into a sorted-pair tree.
pub fn merkle_root_for_data<E: Serialize>(
    data: &BTreeMap<String, E>,
) -> Result<DataMerkle, GeoBatchError> {
    // BTreeMap iteration is already key-sorted by code point for ASCII keys.
    let mut leaves = Vec::with_capacity(data.len());
    let mut leaves_index = BTreeMap::new();
    for (i, (key, entries)) in data.iter().enumerate() {
        let payload = canonical(entries)?;
        let mut buf = Vec::with_capacity(key.len() + 1 + payload.len());
        buf.extend_from_slice(key.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(&payload);
        leaves.push(keccak256(&buf));
        leaves_index.insert(key.clone(), i);
    }
    Ok(DataMerkle {
        root: sorted_pair_root(&leaves),
        leaves_index,
    })
}

/// Builds the epoch super-root from `(geo_batch_id, merkle_root)`
/// pairs. Callers must pass pairs already sorted by `geo_batch_id` so the
/// leaf order, and thus the returned root, is a pure function of the batch
/// set regardless of the order batches were produced in.
pub fn super_root(sorted_batches: &[(String, [u8; 32])]) -> [u8; 32] {
    let leaves: Vec<[u8; 32]> = sorted_batches
        .iter()
        .map(|(id, root)| {
            let mut buf = Vec::with_capacity(id.len() + 32);
            buf.extend_from_slice(id.as_bytes());
            buf.extend_from_slice(root);
            keccak256(&buf)
        })
        .collect();
    sorted_pair_root(&leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_root_equals_leaf_hash() {
        let leaf = keccak256(b"only");
        assert_eq!(sorted_pair_root(&[leaf]), leaf);
    }

    #[test]
    fn data_merkle_is_order_insensitive() {
        let mut a: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        a.insert("c1".into(), vec![1, 2]);
        a.insert("c0".into(), vec![3]);

        let mut b: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        b.insert("c0".into(), vec![3]);
        b.insert("c1".into(), vec![1, 2]);

        let ra = merkle_root_for_data(&a).unwrap();
        let rb = merkle_root_for_data(&b).unwrap();
        assert_eq!(ra.root, rb.root);
        assert_eq!(ra.leaves_index, rb.leaves_index);
    }

    #[test]
    fn changing_a_cell_changes_the_root() {
        let mut a: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        a.insert("c0".into(), vec![1]);
        let mut b = a.clone();
        b.insert("c0".into(), vec![2]);
        assert_ne!(
            merkle_root_for_data(&a).unwrap().root,
            merkle_root_for_data(&b).unwrap().root
        );
    }

    #[test]
    fn super_root_is_permutation_stable() {
        let a = vec![
            ("p0".to_string(), keccak256(b"a")),
            ("p1".to_string(), keccak256(b"b")),
            ("p2".to_string(), keccak256(b"c")),
        ];
        let mut b = a.clone();
        b.reverse();
        b.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(super_root(&a), super_root(&b));
    }

    #[test]
    fn odd_node_promotes_unchanged() {
        let leaves = vec![keccak256(b"a"), keccak256(b"b"), keccak256(b"c")];
        let ab = {
            let (lo, hi) = if leaves[0] <= leaves[1] {
                (leaves[0], leaves[1])
            } else {
                (leaves[1], leaves[0])
            };
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(&lo);
            buf[32..].copy_from_slice(&hi);
            keccak256(&buf)
        };
        let (lo, hi) = if ab <= leaves[2] {
            (ab, leaves[2])
        } else {
            (leaves[2], ab)
        };
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&lo);
        buf[32..].copy_from_slice(&hi);
        let expected = keccak256(&buf);
        assert_eq!(sorted_pair_root(&leaves), expected);
    }
}
