//! Validator & deduplicator.

use std::collections::BTreeMap;
use std::str::FromStr;

use geobatch_error::{GeoBatchError, InvalidSample};
use geobatch_grid::HexGridOracle;
use geobatch_hash::{canonical, sha256_hex};
use geobatch_types::{CellId, Entry, HGCParams, NormalizedSample, OnInvalid, Sample, SensorFields};

/// Outcome of validating and deduplicating one epoch's incoming samples.
pub struct ValidatedSamples {
    pub samples: Vec<NormalizedSample>,
    pub invalid_samples: Vec<InvalidSample>,
}

/// Runs validation, cell-resolution normalization, and dedup over `samples`.
/// `on_invalid = throw` aborts on the first rejection; `mark`
/// collects rejections into `invalid_samples`; `discard` drops them
/// silently. The policy recurses into a sample's inner `samples` array.
///
/// Dedup is scoped per cell: two samples with the same key but different
/// normalized cells are both kept, since the dedup key says nothing about
/// cross-cell collisions.
pub fn validate_and_dedup(
    samples: Vec<Sample>,
    oracle: &dyn HexGridOracle,
    params: &HGCParams,
    on_invalid: OnInvalid,
) -> Result<ValidatedSamples, GeoBatchError> {
    tracing::debug!(incoming = samples.len(), ?on_invalid, "validate_and_dedup: entry");
    let mut by_cell_keyed: BTreeMap<CellId, BTreeMap<String, Entry>> = BTreeMap::new();
    let mut invalid_samples = Vec::new();

    for sample in samples {
        process_sample(
            sample,
            oracle,
            params,
            on_invalid,
            &mut by_cell_keyed,
            &mut invalid_samples,
        )?;
    }

    let mut samples = Vec::new();
    for (cell, keyed) in by_cell_keyed {
        for (dedup_key, entry) in keyed {
            samples.push(NormalizedSample {
                cell,
                entry,
                dedup_key,
            });
        }
    }

    tracing::debug!(
        kept = samples.len(),
        rejected = invalid_samples.len(),
        "validate_and_dedup: exit"
    );
    Ok(ValidatedSamples {
        samples,
        invalid_samples,
    })
}

fn process_sample(
    mut sample: Sample,
    oracle: &dyn HexGridOracle,
    params: &HGCParams,
    on_invalid: OnInvalid,
    by_cell_keyed: &mut BTreeMap<CellId, BTreeMap<String, Entry>>,
    invalid_samples: &mut Vec<InvalidSample>,
) -> Result<(), GeoBatchError> {
    // Recurse into the inner samples array first so a rejected inner
    // reading is filtered out without necessarily rejecting the outer one.
    if let Some(inner) = sample.samples.take() {
        let mut kept = Vec::with_capacity(inner.len());
        for s in inner {
            match validate_one(&s, oracle, params) {
                Ok(normalized) => kept.push(normalized),
                Err(reason) => match on_invalid {
                    OnInvalid::Throw => {
                        return Err(GeoBatchError::Validation {
                            cell: s.geo_cell_id.clone(),
                            reason,
                        })
                    }
                    OnInvalid::Mark => {
                        tracing::warn!(cell = %s.geo_cell_id, %reason, "inner sample marked invalid");
                        invalid_samples.push(InvalidSample {
                            cell: s.geo_cell_id.clone(),
                            field: "inner_sample".to_string(),
                            reason,
                        })
                    }
                    OnInvalid::Discard => {}
                },
            }
        }
        sample.samples = Some(kept);
    }

    match validate_one(&sample, oracle, params) {
        Ok(normalized_cell) => {
            insert_deduped(normalized_cell, sample, by_cell_keyed);
            Ok(())
        }
        Err(reason) => match on_invalid {
            OnInvalid::Throw => Err(GeoBatchError::Validation {
                cell: sample.geo_cell_id.clone(),
                reason,
            }),
            OnInvalid::Mark => {
                tracing::warn!(cell = %sample.geo_cell_id, %reason, "sample marked invalid");
                invalid_samples.push(InvalidSample {
                    cell: sample.geo_cell_id.clone(),
                    field: "geo_cell_id_or_sensor".to_string(),
                    reason,
                });
                Ok(())
            }
            OnInvalid::Discard => Ok(()),
        },
    }
}

/// Validates cell and sensor bounds for one sample, returning the
/// normalized (base-resolution) cell id on success.
fn validate_one(
    sample: &Sample,
    oracle: &dyn HexGridOracle,
    params: &HGCParams,
) -> Result<CellId, String> {
    let cell = CellId::from_str(&sample.geo_cell_id)
        .map_err(|e| format!("malformed cell id {:?}: {e}", sample.geo_cell_id))?;
    if !oracle.is_valid(cell) {
        return Err(format!("invalid cell id {:?}", sample.geo_cell_id));
    }
    validate_sensor_fields(&sample.sensors)?;

    let normalized = if oracle.resolution(cell) == params.base_res {
        cell
    } else {
        oracle
            .cell_to_parent(cell, params.base_res)
            .map_err(|e| format!("cannot normalize cell to base resolution: {e}"))?
    };
    Ok(normalized)
}

fn validate_sensor_fields(fields: &SensorFields) -> Result<(), String> {
    check_range("co2", fields.co2, geobatch_types::CO2_RANGE)?;
    check_range("pm25", fields.pm25, geobatch_types::PM25_RANGE)?;
    check_range("temp", fields.temp, geobatch_types::TEMP_RANGE)?;
    check_range("hum", fields.hum, geobatch_types::HUM_RANGE)?;
    Ok(())
}

fn check_range(name: &str, value: Option<f64>, (lo, hi): (f64, f64)) -> Result<(), String> {
    if let Some(v) = value {
        if !(lo..=hi).contains(&v) {
            return Err(format!("{name}={v} outside [{lo}, {hi}]"));
        }
    }
    Ok(())
}

/// Dedup key: `"{issuer}-{timestamp}"` when both are present,
/// else `sha256Hex(canonical(sample with normalized geoCellId))`. First
/// seen wins within a cell.
fn insert_deduped(
    cell: CellId,
    mut sample: Sample,
    by_cell_keyed: &mut BTreeMap<CellId, BTreeMap<String, Entry>>,
) {
    sample.geo_cell_id = cell.to_string();
    let key = match (&sample.issuer, sample.timestamp) {
        (Some(issuer), Some(ts)) => format!("{issuer}-{ts}"),
        _ => canonical(&sample)
            .map(|bytes| sha256_hex(&bytes))
            .unwrap_or_else(|_| format!("unhashable-{}", by_cell_keyed.len())),
    };

    let entry = Entry {
        timestamp: sample.timestamp.unwrap_or(0),
        issuer: sample.issuer.clone(),
        sensors: sample.sensors.clone(),
        samples: sample.samples.clone(),
    };

    by_cell_keyed.entry(cell).or_default().entry(key).or_insert(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geobatch_grid::ReferenceOracle;
    use geobatch_types::SensorFields;

    fn params() -> HGCParams {
        HGCParams {
            base_res: 3,
            min_res: 0,
            max_leaves_per_batch: 64,
            max_samples_per_batch: 2_000,
            hysteresis_near: 0.9,
            hysteresis_far: 1.1,
            volume: 1_000,
        }
    }

    fn sample(cell: &str, timestamp: Option<i64>, issuer: Option<&str>, pm25: f64) -> Sample {
        Sample {
            geo_cell_id: cell.to_string(),
            timestamp,
            issuer: issuer.map(str::to_string),
            sensors: SensorFields {
                pm25: Some(pm25),
                ..Default::default()
            },
            samples: None,
        }
    }

    #[test]
    fn duplicate_issuer_timestamp_collapses() {
        let cell = CellId::from_parts(3, 1, &[1, 2, 3]).to_string();
        let samples = vec![
            sample(&cell, Some(1), Some("a"), 1.0),
            sample(&cell, Some(1), Some("a"), 1.0),
        ];
        let out =
            validate_and_dedup(samples, &ReferenceOracle, &params(), OnInvalid::Throw).unwrap();
        assert_eq!(out.samples.len(), 1);
    }

    #[test]
    fn invalid_pm25_throws() {
        let cell = CellId::from_parts(3, 1, &[1, 2, 3]).to_string();
        let samples = vec![sample(&cell, Some(1), Some("a"), -1.0)];
        let err =
            validate_and_dedup(samples, &ReferenceOracle, &params(), OnInvalid::Throw).unwrap_err();
        assert!(matches!(err, GeoBatchError::Validation { .. }));
    }

    #[test]
    fn invalid_pm25_discard_vs_mark() {
        let cell = CellId::from_parts(3, 1, &[1, 2, 3]).to_string();
        let bad = sample(&cell, Some(1), Some("a"), -1.0);
        let good = sample(&cell, Some(2), Some("b"), 1.0);

        let discard = validate_and_dedup(
            vec![bad.clone(), good.clone()],
            &ReferenceOracle,
            &params(),
            OnInvalid::Discard,
        )
        .unwrap();
        assert_eq!(discard.samples.len(), 1);
        assert!(discard.invalid_samples.is_empty());

        let mark =
            validate_and_dedup(vec![bad, good], &ReferenceOracle, &params(), OnInvalid::Mark)
                .unwrap();
        assert_eq!(mark.samples.len(), 1);
        assert_eq!(mark.invalid_samples.len(), 1);
    }
}
