//! Per-market analysis: detection through share aggregation.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use stockout_model::{
    AnalysisConfig, DidCounters, DrugSummary, EventId, IngredientDidSummary, IngredientId,
    PharmacyId, PostPeriod, StockoutEvent, SubstituteCandidate, ValidatedEvent,
    ValidationCounters,
};
use stockout_transform::{IngredientSeries, MarketSeries};
use tracing::{debug, info, info_span, warn};

use crate::detect::detect_stockouts;
use crate::did::compute_did;
use crate::error::{CoreError, Result};
use crate::fanout::fan_out;
use crate::gates::check_gates;
use crate::post::{check_post_sales_ratio, resolve_post_period};
use crate::shares::{ShareAggregation, ShareSummary, aggregate_substitute_shares, summarize_shares};
use crate::substitutes::find_substitutes;
use crate::summary::{
    DidMetadata, IngredientStockoutStats, StockoutSummary, ingredient_stats, summarize_drugs,
    summarize_ingredients,
};

/// A validated event with its post-period resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub event: ValidatedEvent,
    pub post: PostPeriod,
    /// Post-window sales ratio check, when a window exists.
    pub post_sales_ok: Option<bool>,
}

/// Everything produced for one ingredient group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub stats: IngredientStockoutStats,
    pub validation: ValidationCounters,
    pub did_counters: DidCounters,
    pub events: Vec<ResolvedEvent>,
    pub did_events: Vec<StockoutEvent>,
    pub mappings: Vec<SubstituteCandidate>,
}

/// A group whose analysis failed; siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub ingredient_id: IngredientId,
    pub message: String,
}

/// Everything produced for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_id: PharmacyId,
    pub ingredient_stats: Vec<IngredientStockoutStats>,
    pub stockout_summary: StockoutSummary,
    pub events: Vec<ResolvedEvent>,
    pub did_counters: DidCounters,
    pub did_events: Vec<StockoutEvent>,
    pub mappings: Vec<SubstituteCandidate>,
    pub drug_summaries: Vec<DrugSummary>,
    pub ingredient_summaries: Vec<IngredientDidSummary>,
    pub did_metadata: DidMetadata,
    pub shares: ShareAggregation,
    pub share_summary: ShareSummary,
    pub failed_groups: Vec<GroupFailure>,
}

/// Runs detection, validation, post-period resolution, substitute search and
/// DiD attribution for one ingredient group.
pub fn analyze_group(group: &IngredientSeries, config: &AnalysisConfig) -> GroupAnalysis {
    let params = &config.stockout;
    let mut validation = ValidationCounters::default();
    let mut did_counters = DidCounters::default();
    let mut events = Vec::new();
    let mut did_events = Vec::new();
    let mut mappings = Vec::new();
    let mut sequence = 0u32;

    for drug in group.drugs.values() {
        for period in detect_stockouts(drug, params.min_stockout_weeks) {
            let passed = match check_gates(group, drug, &period, params) {
                Ok(passed) => {
                    validation.record(None);
                    passed
                }
                Err(reason) => {
                    validation.record(Some(reason));
                    debug!(
                        drug_id = %drug.drug_id,
                        start = %period.start,
                        end = %period.end,
                        reason = %reason,
                        "candidate rejected"
                    );
                    continue;
                }
            };

            sequence += 1;
            let event = ValidatedEvent {
                event_id: EventId::new(group.market_id, group.ingredient_id, sequence),
                market_id: group.market_id,
                ingredient_id: group.ingredient_id,
                ingredient_name: group.ingredient_name.clone(),
                drug_id: drug.drug_id,
                drug_name: drug.attributes.drug_name.clone(),
                nfc1: drug.attributes.nfc1.clone(),
                nfc2: drug.attributes.nfc2.clone(),
                period,
                pre: passed.pre,
                market_during_quantity: passed.market_during_quantity,
            };

            let post = resolve_post_period(drug, period.end, params);
            did_counters.record_post(post.status);
            events.push(ResolvedEvent {
                event: event.clone(),
                post,
                post_sales_ok: check_post_sales_ratio(drug, &post, params),
            });
            if !post.is_valid() {
                debug!(event_id = %event.event_id, status = %post.status, "no post period");
                continue;
            }

            let candidates = find_substitutes(group, &event, &config.compatibility);
            if candidates.is_empty() {
                did_counters.no_substitutes += 1;
            }

            let outcome = compute_did(group, &event, &candidates, params);
            mappings.extend(candidates);
            if !outcome.has_effect(params) {
                did_counters.no_effect += 1;
                debug!(event_id = %event.event_id, "no measurable effect");
                continue;
            }
            did_counters.valid += 1;
            did_events.push(StockoutEvent {
                event,
                post,
                did: outcome.metrics,
                substitutes: outcome.substitutes,
            });
        }
    }

    GroupAnalysis {
        stats: ingredient_stats(
            group.market_id,
            group.ingredient_id,
            &group.ingredient_name,
            group.drugs.len(),
            &validation,
        ),
        validation,
        did_counters,
        events,
        did_events,
        mappings,
    }
}

/// Analyses every ingredient group of a market in parallel and aggregates
/// the results. Failed groups are recorded and skipped.
pub fn analyze_market(
    market_id: PharmacyId,
    series: &MarketSeries,
    config: &AnalysisConfig,
) -> Result<MarketAnalysis> {
    config.validate()?;
    let span = info_span!("market", market_id = %market_id);
    let _guard = span.enter();
    let start = Instant::now();

    // ============================================================
    // Stage 1: Per-group detection and attribution
    // ============================================================
    let groups: Vec<&IngredientSeries> = series.groups.iter().collect();
    let outcomes = fan_out(groups, |group| -> std::result::Result<GroupAnalysis, CoreError> {
        let _span =
            info_span!(parent: &span, "ingredient", ingredient_id = %group.ingredient_id)
                .entered();
        Ok(analyze_group(group, config))
    });

    let mut validation = ValidationCounters::default();
    let mut did_counters = DidCounters::default();
    let mut ingredient_stats = Vec::new();
    let mut events = Vec::new();
    let mut did_events = Vec::new();
    let mut mappings = Vec::new();
    let mut failed_groups = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(group) => {
                validation.merge(&group.validation);
                did_counters.merge(&group.did_counters);
                ingredient_stats.push(group.stats);
                events.extend(group.events);
                did_events.extend(group.did_events);
                mappings.extend(group.mappings);
            }
            Err(message) => {
                let err = CoreError::GroupFailed {
                    market_id,
                    ingredient_id: outcome.key.ingredient_id,
                    message: message.clone(),
                };
                warn!(error = %err, "ingredient group skipped");
                failed_groups.push(GroupFailure {
                    ingredient_id: outcome.key.ingredient_id,
                    message,
                });
            }
        }
    }

    let validated: Vec<ValidatedEvent> = events.iter().map(|e| e.event.clone()).collect();
    let stockout_summary =
        StockoutSummary::build(market_id, ingredient_stats.len(), validation, &validated);
    info!(
        groups = ingredient_stats.len(),
        raw = validation.raw,
        valid = validation.valid,
        did_events = did_events.len(),
        "stockout detection complete"
    );

    // ============================================================
    // Stage 2: Summaries
    // ============================================================
    let drug_summaries = summarize_drugs(&did_events, &config.classification);
    let ingredient_summaries = summarize_ingredients(&did_events);
    let did_metadata = DidMetadata::build(
        market_id,
        config,
        validation.valid,
        did_counters,
        &did_events,
        &drug_summaries,
    );

    // ============================================================
    // Stage 3: Substitute shares
    // ============================================================
    let shares = aggregate_substitute_shares(&did_events, config.stockout.min_total_lift);
    let share_summary = summarize_shares(&shares.records);

    info!(
        drugs = drug_summaries.len(),
        pairs = shares.records.len(),
        duration_ms = start.elapsed().as_millis(),
        "market analysis complete"
    );

    Ok(MarketAnalysis {
        market_id,
        ingredient_stats,
        stockout_summary,
        events,
        did_counters,
        did_events,
        mappings,
        drug_summaries,
        ingredient_summaries,
        did_metadata,
        shares,
        share_summary,
        failed_groups,
    })
}
