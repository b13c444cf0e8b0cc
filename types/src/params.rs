//! `HGCParams` and the `on_invalid` policy.

use serde::{Deserialize, Serialize};

use geobatch_error::GeoBatchError;

/// Fixed epoch window length in milliseconds.
pub const WINDOW_MS: i64 = 3_600_000;
/// Schema version stamped on every persisted batch and super-root record.
pub const SCHEMA_VERSION: u32 = 1;

/// Tuning parameters for the hierarchical geospatial compressor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HGCParams {
    pub base_res: u8,
    pub min_res: u8,
    pub max_leaves_per_batch: u32,
    pub max_samples_per_batch: u32,
    pub hysteresis_near: f64,
    pub hysteresis_far: f64,
    pub volume: u64,
}

impl HGCParams {
    /// Validates the invariants this states for `HGCParams`:
    /// `0 ≤ minRes ≤ baseRes ≤ MAX_RES` and `0 < hysteresisNear ≤ 1 ≤ hysteresisFar`.
    pub fn validate(&self) -> Result<(), GeoBatchError> {
        if self.min_res > self.base_res {
            return Err(GeoBatchError::config(format!(
                "min_res ({}) must be <= base_res ({})",
                self.min_res, self.base_res
            )));
        }
        if self.base_res > crate::cell::MAX_RES {
            return Err(GeoBatchError::config(format!(
                "base_res ({}) exceeds MAX_RES ({})",
                self.base_res,
                crate::cell::MAX_RES
            )));
        }
        if !(self.hysteresis_near > 0.0 && self.hysteresis_near <= 1.0) {
            return Err(GeoBatchError::config(format!(
                "hysteresis_near ({}) must be in (0, 1]",
                self.hysteresis_near
            )));
        }
        if self.hysteresis_far < 1.0 {
            return Err(GeoBatchError::config(format!(
                "hysteresis_far ({}) must be >= 1",
                self.hysteresis_far
            )));
        }
        if self.max_leaves_per_batch == 0 || self.max_samples_per_batch == 0 {
            return Err(GeoBatchError::config(
                "max_leaves_per_batch and max_samples_per_batch must be > 0",
            ));
        }
        Ok(())
    }

    pub fn scaled_max_leaves(&self) -> f64 {
        self.max_leaves_per_batch as f64 * self.hysteresis_far
    }

    pub fn scaled_max_samples(&self) -> f64 {
        self.max_samples_per_batch as f64 * self.hysteresis_far
    }
}

/// Policy governing rejected samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnInvalid {
    Throw,
    Mark,
    Discard,
}

impl Default for OnInvalid {
    fn default() -> Self {
        OnInvalid::Throw
    }
}

impl std::str::FromStr for OnInvalid {
    type Err = GeoBatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "throw" => Ok(OnInvalid::Throw),
            "mark" => Ok(OnInvalid::Mark),
            "discard" => Ok(OnInvalid::Discard),
            other => Err(GeoBatchError::config(format!(
                "unknown on_invalid mode: {other}"
            ))),
        }
    }
}
