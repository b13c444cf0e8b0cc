//! Configuration: volume-tier defaults, the `geobatch.toml` file format,
//! CLI/env/file layering, and logging setup.

pub mod cli;
pub mod file;
pub mod logging;
pub mod resolve;
pub mod tiers;

pub use cli::{Cli, Command, InitArgs, RunArgs, VerifyArgs};
pub use file::FileConfig;
pub use logging::init_logging;
pub use resolve::resolve_params;
pub use tiers::tier_defaults;
