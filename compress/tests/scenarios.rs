//! End-to-end epoch scenarios.

use geobatch_compress::run_epoch;
use geobatch_error::GeoBatchError;
use geobatch_grid::ReferenceOracle;
use geobatch_types::{CellId, HGCParams, OnInvalid, Sample, SensorFields};

fn params() -> HGCParams {
    HGCParams {
        base_res: 8,
        min_res: 0,
        max_leaves_per_batch: 64,
        max_samples_per_batch: 2_000,
        hysteresis_near: 0.9,
        hysteresis_far: 1.1,
        volume: 1_000,
    }
}

fn cell() -> CellId {
    CellId::from_parts(8, 3, &[1, 2, 3, 4, 5, 6, 0, 1])
}

fn sample(ts: Option<i64>, issuer: Option<&str>, pm25: f64) -> Sample {
    Sample {
        geo_cell_id: cell().to_string(),
        timestamp: ts,
        issuer: issuer.map(str::to_string),
        sensors: SensorFields {
            pm25: Some(pm25),
            ..Default::default()
        },
        samples: None,
    }
}

#[test]
fn s1_single_cell_one_sample() {
    let oracle = ReferenceOracle;
    let samples = vec![sample(Some(0), None, 10.0)];
    let result = run_epoch(samples, 0, &oracle, &params(), OnInvalid::Throw).unwrap();

    assert_eq!(result.batches.len(), 1);
    let batch = &result.batches[0];
    assert_eq!(batch.res_batch, 0);
    assert_eq!(batch.count_leaves, 1);
    assert_eq!(batch.count_samples, 1);
    let entries = batch.data.get(&cell().to_string()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sensors.pm25, Some(10.0));
    assert!(!batch.merkle_root.is_empty());
}

#[test]
fn s2_duplicate_collapse() {
    let oracle = ReferenceOracle;
    let samples = vec![
        sample(None, None, 9.0),
        sample(None, None, 9.0),
        sample(None, None, 9.0),
        sample(None, Some("a"), 2.0),
        sample(None, Some("a"), 2.0),
        sample(Some(1), None, 3.0),
    ];
    let result = run_epoch(samples, 0, &oracle, &params(), OnInvalid::Throw).unwrap();
    assert_eq!(result.batches.len(), 1);
    let entries = result.batches[0].data.get(&cell().to_string()).unwrap();
    assert_eq!(entries.len(), 3);
    let mut pm25s: Vec<f64> = entries.iter().filter_map(|e| e.sensors.pm25).collect();
    pm25s.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(pm25s, vec![2.0, 3.0, 9.0]);
}

#[test]
fn s3_invalid_value_throws() {
    let oracle = ReferenceOracle;
    let samples = vec![sample(Some(0), None, -1.0)];
    let err = run_epoch(samples, 0, &oracle, &params(), OnInvalid::Throw).unwrap_err();
    assert!(matches!(err, GeoBatchError::Validation { .. }));
}

#[test]
fn s4_discard_vs_mark() {
    let oracle = ReferenceOracle;
    let bad = sample(Some(0), None, -1.0);
    let good = sample(Some(1), None, 1.0);

    let discard = run_epoch(
        vec![bad.clone(), good.clone()],
        0,
        &oracle,
        &params(),
        OnInvalid::Discard,
    )
    .unwrap();
    assert_eq!(discard.batches.len(), 1);
    assert_eq!(discard.batches[0].count_samples, 1);
    assert!(discard.invalid_samples.is_empty());

    let mark = run_epoch(vec![bad, good], 0, &oracle, &params(), OnInvalid::Mark).unwrap();
    assert_eq!(mark.batches[0].count_samples, 1);
    assert_eq!(mark.invalid_samples.len(), 1);
    assert!(mark.invalid_samples[0].reason.contains("pm25"));
}

#[test]
fn s5_budget_split_is_permutation_stable_and_covers_input() {
    let oracle = ReferenceOracle;
    let mut tight_params = params();
    tight_params.max_leaves_per_batch = 4;
    tight_params.hysteresis_far = 1.0;
    tight_params.base_res = 5;
    tight_params.min_res = 0;

    let cells: Vec<CellId> = (0..20)
        .map(|i| CellId::from_parts(5, 3, &[1, 2, (i % 7), (i / 7) % 7, 0]))
        .collect();
    let samples: Vec<Sample> = cells
        .iter()
        .enumerate()
        .map(|(i, c)| Sample {
            geo_cell_id: c.to_string(),
            timestamp: Some(i as i64),
            issuer: Some(format!("issuer-{i}")),
            sensors: SensorFields {
                pm25: Some(1.0),
                ..Default::default()
            },
            samples: None,
        })
        .collect();

    let result_a = run_epoch(samples.clone(), 0, &oracle, &tight_params, OnInvalid::Throw).unwrap();
    assert!(result_a.batches.len() > 1);
    for b in &result_a.batches {
        assert!(b.count_leaves as u32 <= tight_params.max_leaves_per_batch || b.res_batch == tight_params.base_res);
    }
    let mut covered: Vec<String> = result_a
        .batches
        .iter()
        .flat_map(|b| b.compressed_from.clone())
        .collect();
    covered.sort();
    let mut expected: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
    expected.sort();
    assert_eq!(covered, expected);

    let mut reversed = samples;
    reversed.reverse();
    let result_b = run_epoch(reversed, 0, &oracle, &tight_params, OnInvalid::Throw).unwrap();
    assert_eq!(result_a.super_root, result_b.super_root);
}
