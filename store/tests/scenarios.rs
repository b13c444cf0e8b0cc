//! S6 — cross-epoch map conflict.

use geobatch_compress::run_epoch;
use geobatch_error::GeoBatchError;
use geobatch_grid::ReferenceOracle;
use geobatch_types::{CellId, HGCParams, OnInvalid, Sample, SensorFields};

fn params(base_res: u8, min_res: u8) -> HGCParams {
    HGCParams {
        base_res,
        min_res,
        max_leaves_per_batch: 64,
        max_samples_per_batch: 2_000,
        hysteresis_near: 0.9,
        hysteresis_far: 1.1,
        volume: 1_000,
    }
}

fn samples_at(base_res: u8) -> Vec<Sample> {
    let cell = CellId::from_parts(base_res, 3, &vec![1; base_res as usize]);
    vec![Sample {
        geo_cell_id: cell.to_string(),
        timestamp: Some(0),
        issuer: Some("issuer-a".to_string()),
        sensors: SensorFields {
            pm25: Some(1.0),
            ..Default::default()
        },
        samples: None,
    }]
}

#[test]
fn s6_second_run_with_different_params_conflicts_and_leaves_map_untouched() {
    let oracle = ReferenceOracle;
    let tmp = tempfile::tempdir().unwrap();

    let first = run_epoch(samples_at(6), 0, &oracle, &params(6, 1), OnInvalid::Throw).unwrap();
    geobatch_store::merge_epoch_map(tmp.path(), 0, &first.map).unwrap();
    let map_before = std::fs::read_to_string(tmp.path().join("data").join("cellToBatchMap.json")).unwrap();

    // Same epoch, same leaf cell, but a coarser min_res forces a different
    // geoBatchId parent for the same leaf, producing a conflicting entry.
    let second = run_epoch(samples_at(6), 0, &oracle, &params(6, 0), OnInvalid::Throw).unwrap();
    let err = geobatch_store::merge_epoch_map(tmp.path(), 0, &second.map).unwrap_err();
    assert!(matches!(err, GeoBatchError::CellMapConflict { .. }));

    let map_after = std::fs::read_to_string(tmp.path().join("data").join("cellToBatchMap.json")).unwrap();
    assert_eq!(map_before, map_after);
}
