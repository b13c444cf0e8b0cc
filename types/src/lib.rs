//! Core data model for the geobatch pipeline.

pub mod batch;
pub mod cell;
pub mod epoch;
pub mod params;
pub mod sample;

pub use batch::{Batch, BatchWithoutHash, Point};
pub use cell::{CellId, MAX_RES};
pub use epoch::{CrossEpochMap, EpochResult, NormalizedSample, SuperRootRecord};
pub use params::{HGCParams, OnInvalid, SCHEMA_VERSION, WINDOW_MS};
pub use sample::{Entry, Sample, SensorFields, CO2_RANGE, HUM_RANGE, PM25_RANGE, TEMP_RANGE};
