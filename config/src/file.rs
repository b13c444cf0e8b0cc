//! `geobatch.toml` file format: every `HGCParams` field is optional so a
//! config file can override only what it cares about, falling back to the
//! volume tier default for everything else.

use serde::{Deserialize, Serialize};

use geobatch_error::GeoBatchError;
use geobatch_types::OnInvalid;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub base_res: Option<u8>,
    pub min_res: Option<u8>,
    pub max_leaves_per_batch: Option<u32>,
    pub max_samples_per_batch: Option<u32>,
    pub hysteresis_near: Option<f64>,
    pub hysteresis_far: Option<f64>,
    pub volume: Option<u64>,
    pub on_invalid: Option<OnInvalid>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, GeoBatchError> {
        let text = std::fs::read_to_string(path).map_err(|e| GeoBatchError::io(path, e))?;
        toml::from_str(&text).map_err(|e| GeoBatchError::config(e.to_string()))
    }

    /// Renders a default config populated from a volume tier, for
    /// `geobatch init`.
    pub fn from_tier(volume: u64) -> Self {
        let params = crate::tiers::tier_defaults(volume);
        FileConfig {
            base_res: Some(params.base_res),
            min_res: Some(params.min_res),
            max_leaves_per_batch: Some(params.max_leaves_per_batch),
            max_samples_per_batch: Some(params.max_samples_per_batch),
            hysteresis_near: Some(params.hysteresis_near),
            hysteresis_far: Some(params.hysteresis_far),
            volume: Some(volume),
            on_invalid: Some(OnInvalid::Throw),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, GeoBatchError> {
        toml::to_string_pretty(self).map_err(|e| GeoBatchError::config(e.to_string()))
    }
}
