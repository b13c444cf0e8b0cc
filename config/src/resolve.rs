//! Parameter resolution: CLI flags override environment variables, which
//! override a config file, which overrides the volume tier default.

use std::env;
use std::str::FromStr;

use geobatch_error::GeoBatchError;
use geobatch_types::{HGCParams, OnInvalid};

use crate::cli::RunArgs;
use crate::file::FileConfig;
use crate::tiers::tier_defaults;

fn env_u8(name: &str) -> Option<u8> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
fn env_u32(name: &str) -> Option<u32> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
fn env_f64(name: &str) -> Option<f64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Resolves the effective `(HGCParams, OnInvalid)` for one `run` invocation.
/// `file` is the parsed `geobatch.toml`, if one was found or given.
pub fn resolve_params(
    args: &RunArgs,
    file: Option<&FileConfig>,
) -> Result<(HGCParams, OnInvalid), GeoBatchError> {
    let volume = args
        .volume
        .or_else(|| env_u64("HGC_VOLUME"))
        .or_else(|| file.and_then(|f| f.volume))
        .unwrap_or(1_000);

    let tier = tier_defaults(volume);

    let base_res = args
        .base_res
        .or_else(|| env_u8("HGC_BASE_RES"))
        .or_else(|| file.and_then(|f| f.base_res))
        .unwrap_or(tier.base_res);
    let min_res = args
        .min_res
        .or_else(|| env_u8("HGC_MIN_RES"))
        .or_else(|| file.and_then(|f| f.min_res))
        .unwrap_or(tier.min_res);
    let max_leaves_per_batch = args
        .max_leaves_per_batch
        .or_else(|| env_u32("HGC_MAX_LEAVES_PER_BATCH"))
        .or_else(|| file.and_then(|f| f.max_leaves_per_batch))
        .unwrap_or(tier.max_leaves_per_batch);
    let max_samples_per_batch = args
        .max_samples_per_batch
        .or_else(|| env_u32("HGC_MAX_SAMPLES_PER_BATCH"))
        .or_else(|| file.and_then(|f| f.max_samples_per_batch))
        .unwrap_or(tier.max_samples_per_batch);
    let hysteresis_near = args
        .hysteresis_near
        .or_else(|| env_f64("HGC_HYSTERESIS_NEAR"))
        .or_else(|| file.and_then(|f| f.hysteresis_near))
        .unwrap_or(tier.hysteresis_near);
    let hysteresis_far = args
        .hysteresis_far
        .or_else(|| env_f64("HGC_HYSTERESIS_FAR"))
        .or_else(|| file.and_then(|f| f.hysteresis_far))
        .unwrap_or(tier.hysteresis_far);

    let on_invalid = args
        .on_invalid
        .as_deref()
        .map(OnInvalid::from_str)
        .transpose()?
        .or_else(|| env::var("HGC_ON_INVALID").ok().and_then(|v| OnInvalid::from_str(&v).ok()))
        .or_else(|| file.and_then(|f| f.on_invalid))
        .unwrap_or_default();

    let params = HGCParams {
        base_res,
        min_res,
        max_leaves_per_batch,
        max_samples_per_batch,
        hysteresis_near,
        hysteresis_far,
        volume,
    };
    params.validate()?;
    Ok((params, on_invalid))
}
