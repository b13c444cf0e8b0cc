//! Validator/dedup, cell aggregator, top-down compressor, batch assembler,
//! and epoch super-root builder.

pub mod aggregate;
pub mod assemble;
pub mod compressor;
pub mod runner;
pub mod superroot;
pub mod validate;

pub use aggregate::aggregate;
pub use assemble::assemble_batch;
pub use compressor::{compress, Segment};
pub use runner::run_epoch;
pub use superroot::build_super_root;
pub use validate::{validate_and_dedup, ValidatedSamples};
