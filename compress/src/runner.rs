//! Epoch runner: wires validation, aggregation, compression, batch assembly
//! and the super-root builder into one call per epoch.

use std::collections::BTreeMap;

use geobatch_error::GeoBatchError;
use geobatch_grid::HexGridOracle;
use geobatch_types::{CellId, EpochResult, HGCParams, OnInvalid, Sample};

use crate::aggregate::aggregate;
use crate::assemble::assemble_batch;
use crate::compressor::compress;
use crate::superroot::build_super_root;
use crate::validate::validate_and_dedup;

/// Runs one full epoch: validate/dedup `samples`, aggregate them per cell,
/// compress into batches, hash each batch, and build the epoch super-root.
///
/// `on_invalid = throw` propagates the first validation failure as an
/// error, aborting before anything is assembled.
pub fn run_epoch(
    samples: Vec<Sample>,
    epoch: u64,
    oracle: &dyn HexGridOracle,
    params: &HGCParams,
    on_invalid: OnInvalid,
) -> Result<EpochResult, GeoBatchError> {
    tracing::debug!(epoch, samples = samples.len(), "run_epoch: entry");
    params.validate()?;

    let validated = validate_and_dedup(samples, oracle, params, on_invalid)?;
    if !validated.invalid_samples.is_empty() {
        tracing::warn!(
            epoch,
            count = validated.invalid_samples.len(),
            "validator rejected samples (on_invalid=mark)"
        );
    }
    let entries_by_cell = aggregate(validated.samples);
    tracing::debug!(epoch, cells = entries_by_cell.len(), "aggregation complete");

    let cells: Vec<CellId> = entries_by_cell.keys().copied().collect();
    let sample_count: BTreeMap<CellId, u64> = entries_by_cell
        .iter()
        .map(|(cell, entries)| {
            let weight: u64 = entries.iter().map(|e| e.sample_weight()).sum();
            (*cell, weight)
        })
        .collect();

    let segments = compress(&cells, &sample_count, params, oracle)?;
    tracing::debug!(epoch, segments = segments.len(), "compression complete");

    let mut batches = Vec::with_capacity(segments.len());
    for segment in &segments {
        batches.push(assemble_batch(
            segment,
            epoch,
            &entries_by_cell,
            oracle,
            params,
        )?);
    }

    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for batch in &batches {
        for leaf in &batch.compressed_from {
            map.insert(leaf.clone(), batch.geo_batch_id.clone());
        }
    }

    let (super_root, summary) = build_super_root(&batches, epoch, params)?;
    tracing::info!(
        epoch,
        batches = batches.len(),
        super_root = %super_root,
        "run_epoch: complete"
    );

    Ok(EpochResult {
        batches,
        map,
        super_root,
        summary,
        hgc_params: *params,
        invalid_samples: validated.invalid_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geobatch_grid::ReferenceOracle;
    use geobatch_types::SensorFields;

    fn params() -> HGCParams {
        HGCParams {
            base_res: 3,
            min_res: 1,
            max_leaves_per_batch: 8,
            max_samples_per_batch: 1_000,
            hysteresis_near: 0.9,
            hysteresis_far: 1.1,
            volume: 1_000,
        }
    }

    fn sample(cell: CellId, ts: i64, issuer: &str) -> Sample {
        Sample {
            geo_cell_id: cell.to_string(),
            timestamp: Some(ts),
            issuer: Some(issuer.to_string()),
            sensors: SensorFields {
                pm25: Some(5.0),
                ..Default::default()
            },
            samples: None,
        }
    }

    #[test]
    fn single_sample_single_cell_yields_one_batch() {
        let oracle = ReferenceOracle;
        let cell = CellId::from_parts(3, 2, &[1, 2, 3]);
        let samples = vec![sample(cell, 100, "issuer-a")];
        let result =
            run_epoch(samples, 5, &oracle, &params(), OnInvalid::Throw).unwrap();
        assert_eq!(result.batches.len(), 1);
        assert_eq!(result.batches[0].count_samples, 1);
        assert_eq!(result.map.len(), 1);
    }

    #[test]
    fn map_covers_every_leaf_cell_exactly_once() {
        let oracle = ReferenceOracle;
        let cells = vec![
            CellId::from_parts(3, 2, &[1, 2, 3]),
            CellId::from_parts(3, 2, &[1, 2, 4]),
            CellId::from_parts(3, 5, &[0, 0, 0]),
        ];
        let samples: Vec<Sample> = cells
            .iter()
            .enumerate()
            .map(|(i, &c)| sample(c, i as i64, &format!("issuer-{i}")))
            .collect();
        let result =
            run_epoch(samples, 1, &oracle, &params(), OnInvalid::Throw).unwrap();
        assert_eq!(result.map.len(), cells.len());
        for c in &cells {
            assert!(result.map.contains_key(&c.to_string()));
        }
    }

    #[test]
    fn throw_mode_aborts_whole_epoch_on_bad_sample() {
        let oracle = ReferenceOracle;
        let cell = CellId::from_parts(3, 2, &[1, 2, 3]);
        let mut bad = sample(cell, 1, "issuer-a");
        bad.sensors.pm25 = Some(-5.0);
        let err = run_epoch(vec![bad], 1, &oracle, &params(), OnInvalid::Throw).unwrap_err();
        assert!(matches!(err, GeoBatchError::Validation { .. }));
    }

    #[test]
    fn super_root_matches_independent_of_batch_order() {
        let oracle = ReferenceOracle;
        let cells = vec![
            CellId::from_parts(3, 2, &[1, 2, 3]),
            CellId::from_parts(3, 9, &[4, 5, 6]),
        ];
        let samples: Vec<Sample> = cells
            .iter()
            .enumerate()
            .map(|(i, &c)| sample(c, i as i64, &format!("issuer-{i}")))
            .collect();
        let result_a =
            run_epoch(samples.clone(), 2, &oracle, &params(), OnInvalid::Throw).unwrap();
        let mut reversed = samples;
        reversed.reverse();
        let result_b =
            run_epoch(reversed, 2, &oracle, &params(), OnInvalid::Throw).unwrap();
        assert_eq!(result_a.super_root, result_b.super_root);
    }
}
