use anyhow::{Context, Result};
use tracing::info;

use stockout_cli::pipeline::{RunOptions, load_config, profile_markets, run_analysis};
use stockout_cli::types::RunOutcome;
use stockout_model::PharmacyId;

use crate::cli::{ConfigArgs, ProfileArgs, RunArgs};
use crate::summary::print_profiles;

pub fn run_run(args: &RunArgs) -> Result<RunOutcome> {
    let config = load_config(args.config.as_deref())?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.raw_dir.join("output"));
    let options = RunOptions {
        raw_dir: args.raw_dir.clone(),
        output_dir,
        markets: args.markets.iter().copied().map(PharmacyId::new).collect(),
        config,
        threads: args.threads,
        dry_run: args.dry_run,
    };
    info!(
        raw_dir = %options.raw_dir.display(),
        output_dir = %options.output_dir.display(),
        dry_run = options.dry_run,
        "starting run"
    );
    run_analysis(&options)
}

pub fn run_profile(args: &ProfileArgs) -> Result<bool> {
    let (profiles, failed) = profile_markets(&args.raw_dir)?;
    print_profiles(&profiles, &failed);
    Ok(failed.is_empty())
}

pub fn run_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let json = serde_json::to_string_pretty(&config).context("serialize configuration")?;
    println!("{json}");
    Ok(())
}
