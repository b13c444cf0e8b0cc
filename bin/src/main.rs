//! `geobatch` CLI entry point: `run`, `verify`, `init`.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use geobatch_config::{cli::Command, resolve_params, Cli, FileConfig, InitArgs, RunArgs, VerifyArgs};
use geobatch_error::GeoBatchError;
use geobatch_grid::ReferenceOracle;
use geobatch_sink::{FolderSink, MockFolderSink, MockRegistrySink, RegistrySink};
use geobatch_types::Sample;

#[tokio::main]
async fn main() -> ExitCode {
    geobatch_config::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Verify(args) => verify(args),
        Command::Init(args) => init(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(args: RunArgs) -> Result<(), GeoBatchError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| args.base_dir.join("geobatch.toml"));
    let file_config = if config_path.exists() {
        Some(FileConfig::load(&config_path)?)
    } else {
        None
    };
    let (params, on_invalid) = resolve_params(&args, file_config.as_ref())?;

    let input_bytes = std::fs::read(&args.input).map_err(|e| GeoBatchError::io(&args.input, e))?;
    let samples: Vec<Sample> =
        serde_json::from_slice(&input_bytes).map_err(|e| GeoBatchError::encode(e.to_string()))?;

    info!(epoch = args.epoch, samples = samples.len(), "starting epoch run");

    let oracle = ReferenceOracle;
    let result = geobatch_compress::run_epoch(samples, args.epoch, &oracle, &params, on_invalid)?;

    if !result.invalid_samples.is_empty() {
        tracing::warn!(count = result.invalid_samples.len(), "samples marked invalid");
    }

    let epoch_path = geobatch_store::persist_epoch(&args.base_dir, args.epoch, &result)?;
    geobatch_store::merge_epoch_map(&args.base_dir, args.epoch, &result.map)?;

    let folder_sink = MockFolderSink::new(args.base_dir.join("sink-store"));
    let registry_sink = MockRegistrySink::new(args.base_dir.join("registry.jsonl"));
    let cid = folder_sink.upload_folder(&epoch_path).await?;
    for batch in &result.batches {
        registry_sink
            .register_batch(args.epoch, &batch.geo_batch_id, &batch.merkle_root, &cid)
            .await?;
    }

    info!(
        epoch = args.epoch,
        batches = result.batches.len(),
        super_root = %result.super_root,
        "epoch run complete"
    );
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<(), GeoBatchError> {
    let dir = geobatch_store::epoch_dir(&args.base_dir, args.epoch);
    let report = geobatch_store::verify_epoch_dir(&dir)?;
    for b in &report.batches {
        println!(
            "{}: hash_ok={} merkle_ok={}",
            b.geo_batch_id, b.hash_ok, b.merkle_ok
        );
    }
    println!("super_root_ok={}", report.super_root_ok);
    if report.is_sound() {
        Ok(())
    } else {
        Err(GeoBatchError::encode("verification failed"))
    }
}

fn init(args: InitArgs) -> Result<(), GeoBatchError> {
    std::fs::create_dir_all(&args.base_dir).map_err(|e| GeoBatchError::io(&args.base_dir, e))?;
    let cfg = FileConfig::from_tier(args.volume);
    let text = cfg.to_toml_string()?;
    let path = args.base_dir.join("geobatch.toml");
    std::fs::write(&path, text).map_err(|e| GeoBatchError::io(&path, e))?;
    println!("wrote {}", path.display());
    Ok(())
}
