//! Top-down hierarchical compressor.
//!
//! Walks the cell hierarchy from `min_res` (coarsest) toward `base_res`
//! (finest, where leaf cells actually live), grouping leaf cells under a
//! common ancestor at each resolution and testing the group against the
//! hysteresis-scaled budget. A group that doesn't fit is split one
//! resolution finer using the *unscaled* budget to pack child-groups into
//! batches without ever splitting a child-group across two batches. The
//! walk bottoms out at `base_res`, where the whole remaining group is
//! emitted regardless of budget — the one place the budget invariant is
//! allowed to give way.

use std::collections::BTreeMap;

use geobatch_error::GeoBatchError;
use geobatch_grid::HexGridOracle;
use geobatch_types::{CellId, HGCParams};

/// A set of leaf cells destined for one batch, plus the resolution at
/// which their common ancestor (the batch's `geoBatchId`) is taken.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub res: u8,
    pub cells: Vec<CellId>,
}

/// Entry point: compresses `cells` (all normalized to `params.base_res`)
/// into segments, starting the walk at `params.min_res`.
pub fn compress(
    cells: &[CellId],
    sample_count: &BTreeMap<CellId, u64>,
    params: &HGCParams,
    oracle: &dyn HexGridOracle,
) -> Result<Vec<Segment>, GeoBatchError> {
    let mut cells = cells.to_vec();
    cells.sort();
    compress_level(&cells, params.min_res, sample_count, params, oracle)
}

fn compress_level(
    cells: &[CellId],
    current_res: u8,
    sample_count: &BTreeMap<CellId, u64>,
    params: &HGCParams,
    oracle: &dyn HexGridOracle,
) -> Result<Vec<Segment>, GeoBatchError> {
    if current_res == params.base_res {
        let mut cells = cells.to_vec();
        cells.sort();
        return Ok(vec![Segment {
            res: params.base_res,
            cells,
        }]);
    }

    let groups = group_by_parent(cells, current_res, oracle)?;
    let mut segments = Vec::new();

    for (_, mut children) in groups {
        children.sort();
        let leaf_count = children.len() as u64;
        let volume: u64 = children.iter().map(|c| sample_count.get(c).copied().unwrap_or(0)).sum();

        let fits = (leaf_count as f64) <= params.scaled_max_leaves()
            && (volume as f64) <= params.scaled_max_samples();

        if fits {
            segments.push(Segment {
                res: current_res,
                cells: children,
            });
            continue;
        }

        if current_res + 1 > params.base_res {
            // No finer resolution to descend to: emit anyway.
            segments.push(Segment {
                res: current_res,
                cells: children,
            });
            continue;
        }

        let child_groups = group_by_parent(&children, current_res + 1, oracle)?;
        for chunk in stable_pack(child_groups, sample_count, params) {
            let mut recursed = compress_level(&chunk, current_res + 1, sample_count, params, oracle)?;
            segments.append(&mut recursed);
        }
    }

    Ok(segments)
}

fn group_by_parent(
    cells: &[CellId],
    resolution: u8,
    oracle: &dyn HexGridOracle,
) -> Result<BTreeMap<CellId, Vec<CellId>>, GeoBatchError> {
    let mut groups: BTreeMap<CellId, Vec<CellId>> = BTreeMap::new();
    for &cell in cells {
        let parent = oracle.cell_to_parent(cell, resolution)?;
        groups.entry(parent).or_default().push(cell);
    }
    Ok(groups)
}

/// Packs child-groups (each an atomic, never-split unit) into chunks whose
/// plain, unscaled leaf/sample totals stay within budget. A group is sealed
/// into its own chunk if adding the next one would strictly exceed either
/// budget; an already-oversized single group still gets its own chunk.
fn stable_pack(
    groups: BTreeMap<CellId, Vec<CellId>>,
    sample_count: &BTreeMap<CellId, u64>,
    params: &HGCParams,
) -> Vec<Vec<CellId>> {
    let mut chunks: Vec<Vec<CellId>> = Vec::new();
    let mut current: Vec<CellId> = Vec::new();
    let mut current_leaves: u64 = 0;
    let mut current_volume: u64 = 0;

    for (_, children) in groups {
        let group_leaves = children.len() as u64;
        let group_volume: u64 = children
            .iter()
            .map(|c| sample_count.get(c).copied().unwrap_or(0))
            .sum();

        let would_exceed = !current.is_empty()
            && (current_leaves + group_leaves > params.max_leaves_per_batch as u64
                || current_volume + group_volume > params.max_samples_per_batch as u64);

        if would_exceed {
            chunks.push(std::mem::take(&mut current));
            current_leaves = 0;
            current_volume = 0;
        }

        current.extend(children);
        current_leaves += group_leaves;
        current_volume += group_volume;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
