//! Sensor reading types.

use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value;

/// Declared bounds for the named sensor fields. Extra fields carried in
/// `extra` are not range-checked — only the named fields (`co2, pm25, temp,
/// hum, ...`) have bounds at all.
pub const CO2_RANGE: (f64, f64) = (0.0, 10_000.0);
pub const PM25_RANGE: (f64, f64) = (0.0, 1_000.0);
pub const TEMP_RANGE: (f64, f64) = (-90.0, 60.0);
pub const HUM_RANGE: (f64, f64) = (0.0, 100.0);

/// Sensor fields common to every reading, plus an open-ended extension map
/// for whatever else a concrete deployment wants to carry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hum: Option<f64>,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

/// A raw incoming reading, as received from the ingestion boundary, before
/// cell-resolution normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub geo_cell_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(flatten)]
    pub sensors: SensorFields,
    /// Recursive inner batch; `on_invalid` applies recursively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Sample>>,
}

/// A sample after cell-resolution normalization and deduplication, stored
/// as the value in a batch's `data` map. The cell itself is the map key, so it is not repeated
/// here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(flatten)]
    pub sensors: SensorFields,
    /// Carried over from the source reading's inner `samples` array, if
    /// any, purely for audit; aggregate counting uses [`Entry::sample_weight`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Sample>>,
}

impl Entry {
    /// Aggregate sample count for this entry:
    /// the length of the nested `samples` array if present, else 1.
    pub fn sample_weight(&self) -> u64 {
        self.samples
            .as_ref()
            .map(|inner| inner.len() as u64)
            .unwrap_or(1)
    }
}
