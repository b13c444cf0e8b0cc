//! The `geobatch` CLI surface: `run`, `verify`, `init`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "geobatch", version, about = "Hierarchical geospatial compressor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs one epoch end to end: validate, compress, persist, notify sinks.
    Run(RunArgs),
    /// Re-verifies a persisted epoch's batch hashes and super-root.
    Verify(VerifyArgs),
    /// Writes a starter `geobatch.toml` populated from a volume tier.
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long)]
    pub epoch: u64,
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub base_res: Option<u8>,
    #[arg(long)]
    pub min_res: Option<u8>,
    #[arg(long)]
    pub max_leaves_per_batch: Option<u32>,
    #[arg(long)]
    pub max_samples_per_batch: Option<u32>,
    #[arg(long)]
    pub hysteresis_near: Option<f64>,
    #[arg(long)]
    pub hysteresis_far: Option<f64>,
    #[arg(long)]
    pub volume: Option<u64>,
    #[arg(long)]
    pub on_invalid: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,
    #[arg(long)]
    pub epoch: u64,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,
    #[arg(long, default_value_t = 1_000)]
    pub volume: u64,
}
