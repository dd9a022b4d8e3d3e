//! Analysis pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Discover**: find `Rd2_<CLIENT_ID>.csv` files and apply the market filter
//! 2. **Markets**: per market, in parallel: load, normalize, aggregate, analyse,
//!    validate and write the per-market outputs
//! 3. **Cross-market**: build coefficients and coverage from every market that
//!    completed, then write the cross-market outputs
//!
//! A failed market is recorded and excluded from stage 3.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Local;
use tracing::{Span, debug, error, info, info_span, warn};

use stockout_coefficients::{
    CrossMarketBuild, CrossMarketDrugRow, build_cross_market, cross_market_rows,
};
use stockout_core::{analyze_market, fan_out};
use stockout_ingest::{
    DrugCatalog, MarketFile, MarketProfile, discover_market_files, read_market_file,
};
use stockout_model::{AnalysisConfig, PharmacyId};
use stockout_report::{
    FailedMarket, MarketOutputs, MarketRunSummary, RunMetadata, render_validation_report,
    write_cross_market_outputs, write_market_outputs, write_market_rows, write_run_metadata,
    write_validation_report,
};
use stockout_transform::{aggregate_market, normalize_observations};
use stockout_validate::{MarketResults, run_all};

use crate::types::{MarketRun, RunOutcome};

/// Inputs of a full run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Empty means every discovered market.
    pub markets: Vec<PharmacyId>,
    pub config: AnalysisConfig,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub dry_run: bool,
}

/// Loads an optional JSON override file and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    config.validate().context("invalid analysis configuration")?;
    Ok(config)
}

// ============================================================================
// Stage 1: Discover
// ============================================================================

/// Discovers market files, keeping only `filter` when it is not empty.
pub fn discover(raw_dir: &Path, filter: &[PharmacyId]) -> Result<Vec<MarketFile>> {
    let files = discover_market_files(raw_dir)
        .with_context(|| format!("discover markets in {}", raw_dir.display()))?;
    if filter.is_empty() {
        return Ok(files);
    }

    let wanted: BTreeSet<PharmacyId> = filter.iter().copied().collect();
    let found: BTreeSet<PharmacyId> = files.iter().map(|file| file.market_id).collect();
    for missing in wanted.difference(&found) {
        warn!(market_id = %missing, "requested market has no file");
    }
    let files: Vec<MarketFile> = files
        .into_iter()
        .filter(|file| wanted.contains(&file.market_id))
        .collect();
    if files.is_empty() {
        bail!("none of the requested markets exist in {}", raw_dir.display());
    }
    Ok(files)
}

// ============================================================================
// Stage 2: Markets
// ============================================================================

/// Runs every per-market stage for one file.
///
/// Outputs go under `output_dir` unless it is `None`.
pub fn run_market(
    file: &MarketFile,
    config: &AnalysisConfig,
    output_dir: Option<&Path>,
) -> Result<MarketRun> {
    let market_id = file.market_id;
    let span = info_span!("market_run", market_id = %market_id);
    let _guard = span.enter();
    let start = Instant::now();

    let loaded = read_market_file(&file.path, Some(market_id))
        .with_context(|| format!("load {}", file.path.display()))?;
    let profile = MarketProfile::from_market(&loaded);
    let mut catalog = DrugCatalog::new();
    catalog.merge(&loaded);
    debug!(records = profile.records_count, "market loaded");

    let normalized = normalize_observations(&loaded.observations)
        .with_context(|| format!("normalize market {market_id}"))?;
    let series = aggregate_market(market_id, &normalized, &config.stockout)
        .with_context(|| format!("aggregate market {market_id}"))?;
    drop(normalized);

    let analysis = analyze_market(market_id, &series, config)
        .with_context(|| format!("analyse market {market_id}"))?;

    let results = MarketResults {
        market_id,
        validation: &analysis.stockout_summary.counters,
        did_counters: &analysis.did_counters,
        validated_events: analysis.events.len(),
        did_events: &analysis.did_events,
        shares: &analysis.shares.records,
    };
    let validation = run_all(&results, &config.stockout);

    let written = match output_dir {
        Some(dir) => Some(write_market_outputs(
            dir,
            &MarketOutputs {
                profile: &profile,
                series: &series,
                analysis: &analysis,
                validation: &validation,
            },
        )?),
        None => None,
    };

    let cross_rows = cross_market_rows(
        market_id,
        &analysis.drug_summaries,
        &analysis.did_events,
        &analysis.shares.records,
    );
    let duration_ms = start.elapsed().as_millis();
    info!(
        events = analysis.events.len(),
        did_events = analysis.did_events.len(),
        issues = validation.issues.len(),
        duration_ms,
        "market complete"
    );

    Ok(MarketRun {
        summary: MarketRunSummary {
            market_id,
            validated_events: analysis.events.len(),
            did_events: analysis.did_events.len(),
            share_pairs: analysis.shares.records.len(),
            issue_errors: validation.error_count(),
            issue_warnings: validation.warning_count(),
            duration_ms,
        },
        profile,
        catalog,
        validation,
        cross_rows,
        failed_groups: analysis.failed_groups.len(),
        output_dir: written,
    })
}

/// Fans markets out over the current rayon pool.
pub fn run_markets(
    files: Vec<MarketFile>,
    config: &AnalysisConfig,
    output_dir: Option<&Path>,
) -> (Vec<MarketRun>, Vec<FailedMarket>) {
    // Worker threads do not inherit the caller's span stack.
    let run_span = Span::current();
    let outcomes = fan_out(files, |file| {
        run_span
            .in_scope(|| run_market(file, config, output_dir))
            .map_err(|err| format!("{err:#}"))
    });

    let mut runs = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(run) => runs.push(run),
            Err(message) => {
                error!(market_id = %outcome.key.market_id, error = %message, "market failed");
                failed.push(FailedMarket {
                    market_id: outcome.key.market_id,
                    error: message,
                });
            }
        }
    }
    (runs, failed)
}

// ============================================================================
// Stage 3: Cross-market
// ============================================================================

/// Merges the per-market drug catalogs in market id order.
pub fn merge_catalogs(runs: &[MarketRun]) -> DrugCatalog {
    let mut ordered: Vec<&MarketRun> = runs.iter().collect();
    ordered.sort_by_key(|run| run.summary.market_id);
    let mut catalog = DrugCatalog::new();
    for run in ordered {
        catalog.absorb(&run.catalog);
    }
    catalog
}

pub fn cross_market(
    runs: &[MarketRun],
    catalog: &DrugCatalog,
    config: &AnalysisConfig,
) -> CrossMarketBuild {
    let markets: BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>> = runs
        .iter()
        .map(|run| (run.summary.market_id, run.cross_rows.clone()))
        .collect();
    build_cross_market(&markets, catalog.len(), &config.coverage)
}

fn write_cross_market(
    options: &RunOptions,
    runs: &[MarketRun],
    failed: &[FailedMarket],
    discovered: usize,
    catalog: &DrugCatalog,
    build: &CrossMarketBuild,
) -> Result<PathBuf> {
    let out = &options.output_dir;
    for run in runs {
        write_market_rows(out, run.summary.market_id, &run.cross_rows)?;
    }
    let entries: Vec<_> = catalog.entries().cloned().collect();
    let dir = write_cross_market_outputs(out, build, &entries)?;

    let now = Local::now();
    let reports: Vec<_> = runs.iter().map(|run| run.validation.clone()).collect();
    let text = render_validation_report(build, &reports, now.naive_local());
    write_validation_report(out, &text)?;

    let metadata = RunMetadata {
        generated_at: now.to_rfc3339(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        raw_dir: options.raw_dir.clone(),
        config: options.config.clone(),
        markets_discovered: discovered,
        markets: runs.iter().map(|run| run.summary.clone()).collect(),
        failed_markets: failed.to_vec(),
        total_drugs_raw: catalog.len(),
        total_drugs_researched: build.researched.len(),
        coverage_checks_passed: build.passed(),
    };
    write_run_metadata(out, &metadata)?;
    Ok(dir)
}

/// Runs all stages.
///
/// Market failures are reported in the outcome; only errors that stop the
/// whole run (no markets, unwritable output) are returned as `Err`.
pub fn run_analysis(options: &RunOptions) -> Result<RunOutcome> {
    let run_span = info_span!("run", raw_dir = %options.raw_dir.display());
    let _run_guard = run_span.enter();
    options
        .config
        .validate()
        .context("invalid analysis configuration")?;

    // =========================================================================
    // Stage 1: Discover
    // =========================================================================
    let files = discover(&options.raw_dir, &options.markets)?;
    let discovered = files.len();
    info!(markets = discovered, "markets discovered");

    // =========================================================================
    // Stage 2: Markets
    // =========================================================================
    let markets_start = Instant::now();
    let output_dir = (!options.dry_run).then_some(options.output_dir.as_path());
    let (mut runs, failed) = match options.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("build worker pool")?;
            pool.install(|| run_markets(files, &options.config, output_dir))
        }
        None => run_markets(files, &options.config, output_dir),
    };
    runs.sort_by_key(|run| run.summary.market_id);
    info!(
        completed = runs.len(),
        failed = failed.len(),
        duration_ms = markets_start.elapsed().as_millis(),
        "market stage complete"
    );

    // =========================================================================
    // Stage 3: Cross-market
    // =========================================================================
    let catalog = merge_catalogs(&runs);
    let build = cross_market(&runs, &catalog, &options.config);
    let cross_market_dir = if options.dry_run {
        None
    } else {
        Some(write_cross_market(
            options, &runs, &failed, discovered, &catalog, &build,
        )?)
    };

    Ok(RunOutcome {
        output_dir: options.output_dir.clone(),
        total_drugs_raw: catalog.len(),
        markets: runs,
        failed,
        cross_market: build,
        cross_market_dir,
    })
}

/// Loads every market file and returns its profile.
pub fn profile_markets(raw_dir: &Path) -> Result<(Vec<MarketProfile>, Vec<FailedMarket>)> {
    let files = discover(raw_dir, &[])?;
    let outcomes = fan_out(files, |file| {
        read_market_file(&file.path, Some(file.market_id))
            .map(|market| MarketProfile::from_market(&market))
    });
    let mut profiles = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(profile) => profiles.push(profile),
            Err(error) => failed.push(FailedMarket {
                market_id: outcome.key.market_id,
                error,
            }),
        }
    }
    Ok((profiles, failed))
}
