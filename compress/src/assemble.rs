//! Batch assembler: turns a [`Segment`] plus its entries into a
//! fully hashed [`Batch`].

use std::collections::BTreeMap;

use geobatch_error::GeoBatchError;
use geobatch_grid::HexGridOracle;
use geobatch_hash::{canonical, hex_string, merkle_root_for_data, sha256_hex};
use geobatch_types::{Batch, CellId, Entry, HGCParams, SCHEMA_VERSION, WINDOW_MS};

use crate::compressor::Segment;

/// Assembles one [`Batch`] from `segment`'s leaf cells, looking up each
/// cell's entries in `entries_by_cell`. `geoBatchId` is the segment's common
/// ancestor at `segment.res`, taken from the (sorted) first leaf cell.
pub fn assemble_batch(
    segment: &Segment,
    epoch: u64,
    entries_by_cell: &BTreeMap<CellId, Vec<Entry>>,
    oracle: &dyn HexGridOracle,
    params: &HGCParams,
) -> Result<Batch, GeoBatchError> {
    let mut cells = segment.cells.clone();
    cells.sort();
    let geo_batch_cell = oracle.cell_to_parent(cells[0], segment.res)?;
    let geo_batch_id = geo_batch_cell.to_string();

    let mut data: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    let mut count_samples: u64 = 0;
    let mut ts_min: Option<i64> = None;
    let mut ts_max: Option<i64> = None;

    for cell in &cells {
        let entries = entries_by_cell.get(cell).cloned().unwrap_or_default();
        for e in &entries {
            count_samples += e.sample_weight();
            ts_min = Some(ts_min.map_or(e.timestamp, |m| m.min(e.timestamp)));
            ts_max = Some(ts_max.map_or(e.timestamp, |m| m.max(e.timestamp)));
        }
        data.insert(cell.to_string(), entries);
    }

    let center = oracle.cell_to_center(geo_batch_cell);
    let boundary = oracle.cell_to_boundary(geo_batch_cell);
    let merkle = merkle_root_for_data(&data)?;

    let mut batch = Batch {
        geo_batch_id,
        epoch,
        compressed_from: cells.iter().map(|c| c.to_string()).collect(),
        data,
        count_leaves: cells.len() as u32,
        count_samples,
        ts_min,
        ts_max,
        center,
        boundary,
        res_base: params.base_res,
        res_batch: segment.res,
        epoch_start_ms: (epoch as i64) * WINDOW_MS,
        window_ms: WINDOW_MS,
        schema_version: SCHEMA_VERSION,
        hgc_params: *params,
        merkle_root: hex_string(&merkle.root),
        leaves_index: merkle.leaves_index,
        hash: String::new(),
    };

    let canon = canonical(&batch.without_hash())?;
    batch.hash = sha256_hex(&canon);
    Ok(batch)
}
