//! Per-market output files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use stockout_core::MarketAnalysis;
use stockout_ingest::MarketProfile;
use stockout_model::{EventId, ValidatedEvent};
use stockout_transform::MarketSeries;
use stockout_validate::{IssueRecord, ValidationReport};
use tracing::debug;

use crate::common::{CsvRow, MetricPair, ensure_output_dir, write_csv};
use crate::rows::{
    DidResultRow, DidSummaryRow, DrugSummaryRow, IngredientStockoutRow, IngredientSummaryRow,
    MarketProfileRow, SeriesSummaryRow, StockoutEventRow, SubstituteMappingRow,
    SubstituteShareRow,
};

pub const PER_MARKET_DIR: &str = "per_market";

impl CsvRow for IssueRecord {
    const HEADERS: &'static [&'static str] = &[
        "MARKET_ID",
        "RULE_ID",
        "SEVERITY",
        "CATEGORY",
        "SUBJECT",
        "MESSAGE",
    ];
}

/// Everything written for one market.
#[derive(Debug, Clone, Copy)]
pub struct MarketOutputs<'a> {
    pub profile: &'a MarketProfile,
    pub series: &'a MarketSeries,
    pub analysis: &'a MarketAnalysis,
    pub validation: &'a ValidationReport,
}

fn write_rows<'a, R, T>(path: &Path, items: &'a [T]) -> Result<()>
where
    R: CsvRow + From<&'a T>,
    T: 'a,
{
    let rows: Vec<R> = items.iter().map(R::from).collect();
    write_csv(path, &rows)
}

/// Writes every per-market file under `<out_dir>/per_market/<market_id>/`
/// and returns that directory.
pub fn write_market_outputs(out_dir: &Path, outputs: &MarketOutputs<'_>) -> Result<PathBuf> {
    let market_id = outputs.analysis.market_id;
    let base = ensure_output_dir(out_dir, PER_MARKET_DIR)?;
    let dir = ensure_output_dir(&base, &market_id.to_string())?;
    let analysis = outputs.analysis;

    // Series preparation
    write_rows::<SeriesSummaryRow, _>(
        &dir.join("series_summary.csv"),
        &outputs.series.series_stats,
    )?;
    write_rows::<IngredientSummaryRow, _>(
        &dir.join("ingredient_summary.csv"),
        &outputs.series.ingredient_summaries,
    )?;
    write_csv(
        &dir.join("market_profile.csv"),
        &[MarketProfileRow::from(outputs.profile)],
    )?;

    // Detection
    write_rows::<StockoutEventRow, _>(&dir.join("stockout_events.csv"), &analysis.events)?;
    write_rows::<IngredientStockoutRow, _>(
        &dir.join("stockout_per_ingredient.csv"),
        &analysis.ingredient_stats,
    )?;
    write_csv(
        &dir.join("stockout_summary.csv"),
        &stockout_summary_metrics(analysis),
    )?;

    // Attribution
    write_rows::<DidResultRow, _>(&dir.join("did_results.csv"), &analysis.did_events)?;
    write_csv(&dir.join("substitute_mapping.csv"), &mapping_rows(analysis))?;
    write_rows::<DidSummaryRow, _>(&dir.join("did_summary.csv"), &analysis.ingredient_summaries)?;
    write_rows::<DrugSummaryRow, _>(&dir.join("drugs_summary.csv"), &analysis.drug_summaries)?;
    write_csv(&dir.join("did_metadata.csv"), &did_metadata_metrics(analysis))?;

    // Substitute shares
    write_rows::<SubstituteShareRow, _>(
        &dir.join("substitute_shares.csv"),
        &analysis.shares.records,
    )?;
    write_csv(
        &dir.join("substitute_summary.csv"),
        &share_summary_metrics(analysis),
    )?;
    write_csv(
        &dir.join("substitute_metadata.csv"),
        &share_metadata_metrics(analysis),
    )?;

    write_csv(
        &dir.join("validation_issues.csv"),
        &outputs.validation.records(),
    )?;

    debug!(market_id = %market_id, dir = %dir.display(), "market outputs written");
    Ok(dir)
}

fn mapping_rows(analysis: &MarketAnalysis) -> Vec<SubstituteMappingRow> {
    let events: BTreeMap<&EventId, &ValidatedEvent> = analysis
        .events
        .iter()
        .map(|resolved| (&resolved.event.event_id, &resolved.event))
        .collect();
    analysis
        .mappings
        .iter()
        .filter_map(|candidate| {
            events
                .get(&candidate.event_id)
                .map(|event| SubstituteMappingRow::new(event, candidate))
        })
        .collect()
}

fn stockout_summary_metrics(analysis: &MarketAnalysis) -> Vec<MetricPair> {
    let s = &analysis.stockout_summary;
    vec![
        MetricPair::new("CLIENT_ID", s.market_id),
        MetricPair::new("INN_GROUPS", s.ingredient_count),
        MetricPair::new("RAW_EVENTS", s.counters.raw),
        MetricPair::new("VALID_EVENTS", s.counters.valid),
        MetricPair::new("REJECTED_NO_MARKET_ACTIVITY", s.counters.no_market_activity),
        MetricPair::new("REJECTED_NO_PRE_SALES", s.counters.no_pre_sales),
        MetricPair::new("REJECTED_NO_COMPETITORS", s.counters.no_competitors),
        MetricPair::new("VALIDATION_RATE", s.validation_rate),
        MetricPair::new("UNIQUE_DRUGS", s.unique_drugs),
        MetricPair::new("AVG_STOCKOUT_WEEKS", s.avg_stockout_weeks),
        MetricPair::new("FAILED_INN_GROUPS", analysis.failed_groups.len()),
    ]
}

fn did_metadata_metrics(analysis: &MarketAnalysis) -> Vec<MetricPair> {
    let m = &analysis.did_metadata;
    let mut metrics = vec![
        MetricPair::new("CLIENT_ID", m.market_id),
        MetricPair::new("MIN_STOCKOUT_WEEKS", m.min_stockout_weeks),
        MetricPair::new("MIN_PRE_WEEKS", m.min_pre_weeks),
        MetricPair::new("MIN_POST_WEEKS", m.min_post_weeks),
        MetricPair::new("MAX_POST_GAP_WEEKS", m.max_post_gap_weeks),
        MetricPair::new("MIN_TOTAL_FOR_SHARE", m.min_total_for_share),
        MetricPair::new("EVENTS_VALIDATED", m.events_validated),
        MetricPair::new("EVENTS_VALID", m.counters.valid),
        MetricPair::new("NO_POST_PERIOD", m.counters.no_post_period()),
        MetricPair::new("NO_RECOVERY", m.counters.no_recovery),
        MetricPair::new("GAP_TOO_LARGE", m.counters.gap_too_large),
        MetricPair::new("INSUFFICIENT_DATA", m.counters.insufficient_data),
        MetricPair::new("NO_SUBSTITUTES", m.counters.no_substitutes),
        MetricPair::new("NO_EFFECT", m.counters.no_effect),
        MetricPair::new("TOTAL_INTERNAL_LIFT", m.total_internal_lift),
        MetricPair::new("TOTAL_LOST_SALES", m.total_lost_sales),
        MetricPair::optional("AVG_SHARE_INTERNAL", m.avg_share_internal),
        MetricPair::optional("AVG_SHARE_LOST", m.avg_share_lost),
    ];
    for (classification, count) in &m.classification_counts {
        metrics.push(MetricPair::new(&format!("DRUGS_{classification}"), count));
    }
    metrics
}

fn share_summary_metrics(analysis: &MarketAnalysis) -> Vec<MetricPair> {
    let s = &analysis.share_summary;
    vec![
        MetricPair::new("UNIQUE_STOCKOUT_DRUGS", s.unique_stockout_drugs),
        MetricPair::new("UNIQUE_SUBSTITUTES", s.unique_substitutes),
        MetricPair::new("TOTAL_PAIRS", s.total_pairs),
        MetricPair::new("TOTAL_LIFT", s.total_lift),
        MetricPair::new("AVG_SHARE", s.avg_share),
        MetricPair::new("MEDIAN_SHARE", s.median_share),
        MetricPair::new("LIFT_SAME_NFC1", s.lift_same_nfc1),
        MetricPair::new("LIFT_DIFF_NFC1", s.lift_diff_nfc1),
        MetricPair::new("SHARE_SAME_NFC1_PERCENT", s.share_same_nfc1_percent),
        MetricPair::new("COUNT_SHARE_100", s.count_share_100),
        MetricPair::new("COUNT_SHARE_50_99", s.count_share_50_99),
        MetricPair::new("COUNT_SHARE_25_49", s.count_share_25_49),
        MetricPair::new("COUNT_SHARE_10_24", s.count_share_10_24),
        MetricPair::new("COUNT_SHARE_BELOW_10", s.count_share_below_10),
    ]
}

fn share_metadata_metrics(analysis: &MarketAnalysis) -> Vec<MetricPair> {
    let m = &analysis.shares.metadata;
    vec![
        MetricPair::new("EVENTS_PROCESSED", m.events_processed),
        MetricPair::new("EVENTS_WITH_LIFT", m.events_with_lift),
        MetricPair::new("PAIRS_TOTAL", m.pairs_total),
        MetricPair::new("PAIRS_AFTER_FILTER", m.pairs_after_filter),
        MetricPair::new("PAIRS_FILTERED_ZERO_LIFT", m.pairs_filtered_zero_lift),
    ]
}
