//! Cell aggregator: groups validated, deduplicated
//! samples into per-cell reading lists, sorted ascending by timestamp.

use std::collections::BTreeMap;

use geobatch_types::{CellId, Entry, NormalizedSample};

/// Groups `samples` by normalized cell. Entries within a cell are sorted by
/// timestamp ascending; entries sharing a timestamp keep their relative
/// input order (`sort_by_key` is stable).
pub fn aggregate(samples: Vec<NormalizedSample>) -> BTreeMap<CellId, Vec<Entry>> {
    let mut by_cell: BTreeMap<CellId, Vec<Entry>> = BTreeMap::new();
    for s in samples {
        by_cell.entry(s.cell).or_default().push(s.entry);
    }
    for entries in by_cell.values_mut() {
        entries.sort_by_key(|e| e.timestamp);
    }
    by_cell
}
