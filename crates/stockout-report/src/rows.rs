//! Flat export rows, one type per output file.

use chrono::NaiveDate;
use serde::Serialize;
use stockout_coefficients::{CrossMarketDrugRow, ResearchedDrug};
use stockout_core::{IngredientStockoutStats, ResolvedEvent};
use stockout_ingest::{DrugCatalogEntry, MarketProfile};
use stockout_model::{
    DrugSummary, IngredientDidSummary, StockoutEvent, SubstituteCandidate, SubstituteShareRecord,
    ValidatedEvent,
};
use stockout_transform::{DrugSeriesStats, IngredientSeriesSummary};

use crate::common::CsvRow;

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummaryRow {
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub drugs_id: i64,
    pub drugs_name: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub date_diff_days: i64,
    pub weeks_total: usize,
    pub weeks_with_sales: usize,
    pub sales_ratio: f64,
    pub total_quantity: f64,
    pub notsold_percent: f64,
    pub included: bool,
}

impl CsvRow for SeriesSummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "DRUGS_ID",
        "DRUGS_NAME",
        "DATE_START",
        "DATE_END",
        "DATE_DIFF_DAYS",
        "WEEKS_TOTAL",
        "WEEKS_WITH_SALES",
        "SALES_RATIO",
        "TOTAL_QUANTITY",
        "NOTSOLD_PERCENT",
        "INCLUDED",
    ];
}

impl From<&DrugSeriesStats> for SeriesSummaryRow {
    fn from(s: &DrugSeriesStats) -> Self {
        Self {
            client_id: s.market_id.get(),
            inn_id: s.ingredient_id.get(),
            inn_name: s.ingredient_name.clone(),
            drugs_id: s.drug_id.get(),
            drugs_name: s.drug_name.clone(),
            date_start: s.date_start.date(),
            date_end: s.date_end.date(),
            date_diff_days: s.date_diff_days,
            weeks_total: s.weeks_total,
            weeks_with_sales: s.weeks_with_sales,
            sales_ratio: s.sales_ratio,
            total_quantity: s.total_quantity,
            notsold_percent: s.notsold_percent,
            included: s.included,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientSummaryRow {
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub drugs_count: usize,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub weeks_total: usize,
    pub weeks_with_sales: usize,
    pub total_quantity: f64,
    pub avg_sales_ratio: f64,
}

impl CsvRow for IngredientSummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "DRUGS_COUNT",
        "DATE_START",
        "DATE_END",
        "WEEKS_TOTAL",
        "WEEKS_WITH_SALES",
        "TOTAL_QUANTITY",
        "AVG_SALES_RATIO",
    ];
}

impl From<&IngredientSeriesSummary> for IngredientSummaryRow {
    fn from(s: &IngredientSeriesSummary) -> Self {
        Self {
            client_id: s.market_id.get(),
            inn_id: s.ingredient_id.get(),
            inn_name: s.ingredient_name.clone(),
            drugs_count: s.drugs_count,
            date_start: s.date_start.date(),
            date_end: s.date_end.date(),
            weeks_total: s.weeks_total,
            weeks_with_sales: s.weeks_with_sales,
            total_quantity: s.total_quantity,
            avg_sales_ratio: s.avg_sales_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketProfileRow {
    pub client_id: i64,
    pub file_name: String,
    pub competitors_count: usize,
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
    pub days_range: i64,
    pub weeks_range: i64,
    pub drugs_count: usize,
    pub inn_count: usize,
    pub records_count: usize,
}

impl CsvRow for MarketProfileRow {
    const HEADERS: &'static [&'static str] = &[
        "CLIENT_ID",
        "FILE_NAME",
        "COMPETITORS_COUNT",
        "DATA_START",
        "DATA_END",
        "DAYS_RANGE",
        "WEEKS_RANGE",
        "DRUGS_COUNT",
        "INN_COUNT",
        "RECORDS_COUNT",
    ];
}

impl From<&MarketProfile> for MarketProfileRow {
    fn from(p: &MarketProfile) -> Self {
        Self {
            client_id: p.market_id.get(),
            file_name: p.file_name.clone(),
            competitors_count: p.competitors_count,
            data_start: p.data_start,
            data_end: p.data_end,
            days_range: p.days_range,
            weeks_range: p.weeks_range,
            drugs_count: p.drugs_count,
            inn_count: p.ingredients_count,
            records_count: p.records_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockoutEventRow {
    pub event_id: String,
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub drugs_id: i64,
    pub drugs_name: String,
    pub nfc1_id: String,
    pub nfc_id: String,
    pub stockout_start: NaiveDate,
    pub stockout_end: NaiveDate,
    pub stockout_weeks: u32,
    pub pre_start: NaiveDate,
    pub pre_end: NaiveDate,
    pub pre_weeks: u32,
    pub pre_total_q: f64,
    pub pre_avg_q: f64,
    pub market_during_q: f64,
    pub post_status: &'static str,
    pub post_start: Option<NaiveDate>,
    pub post_end: Option<NaiveDate>,
    pub post_weeks: u32,
    pub post_gap_weeks: Option<i64>,
    pub post_sales_ok: Option<bool>,
}

impl CsvRow for StockoutEventRow {
    const HEADERS: &'static [&'static str] = &[
        "EVENT_ID",
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "DRUGS_ID",
        "DRUGS_NAME",
        "NFC1_ID",
        "NFC_ID",
        "STOCKOUT_START",
        "STOCKOUT_END",
        "STOCKOUT_WEEKS",
        "PRE_START",
        "PRE_END",
        "PRE_WEEKS",
        "PRE_TOTAL_Q",
        "PRE_AVG_Q",
        "MARKET_DURING_Q",
        "POST_STATUS",
        "POST_START",
        "POST_END",
        "POST_WEEKS",
        "POST_GAP_WEEKS",
        "POST_SALES_OK",
    ];
}

impl From<&ResolvedEvent> for StockoutEventRow {
    fn from(r: &ResolvedEvent) -> Self {
        let e = &r.event;
        Self {
            event_id: e.event_id.to_string(),
            client_id: e.market_id.get(),
            inn_id: e.ingredient_id.get(),
            inn_name: e.ingredient_name.clone(),
            drugs_id: e.drug_id.get(),
            drugs_name: e.drug_name.clone(),
            nfc1_id: e.nfc1.clone(),
            nfc_id: e.nfc2.clone(),
            stockout_start: e.period.start.date(),
            stockout_end: e.period.end.date(),
            stockout_weeks: e.period.weeks,
            pre_start: e.pre.window.start.date(),
            pre_end: e.pre.window.end.date(),
            pre_weeks: e.pre.weeks,
            pre_total_q: e.pre.total_quantity,
            pre_avg_q: e.pre.avg_quantity,
            market_during_q: e.market_during_quantity,
            post_status: r.post.status.as_str(),
            post_start: r.post.window.map(|w| w.start.date()),
            post_end: r.post.window.map(|w| w.end.date()),
            post_weeks: r.post.weeks,
            post_gap_weeks: r.post.gap_weeks,
            post_sales_ok: r.post_sales_ok,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientStockoutRow {
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub drugs_count: usize,
    pub raw_events: usize,
    pub valid_events: usize,
    pub validation_rate: f64,
}

impl CsvRow for IngredientStockoutRow {
    const HEADERS: &'static [&'static str] = &[
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "DRUGS_COUNT",
        "RAW_EVENTS",
        "VALID_EVENTS",
        "VALIDATION_RATE",
    ];
}

impl From<&IngredientStockoutStats> for IngredientStockoutRow {
    fn from(s: &IngredientStockoutStats) -> Self {
        Self {
            client_id: s.market_id.get(),
            inn_id: s.ingredient_id.get(),
            inn_name: s.ingredient_name.clone(),
            drugs_count: s.drugs_count,
            raw_events: s.raw_events,
            valid_events: s.valid_events,
            validation_rate: s.validation_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DidResultRow {
    pub event_id: String,
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub drugs_id: i64,
    pub drugs_name: String,
    pub nfc1_id: String,
    pub stockout_start: NaiveDate,
    pub stockout_end: NaiveDate,
    pub stockout_weeks: u32,
    pub pre_avg_q: f64,
    pub post_start: Option<NaiveDate>,
    pub post_end: Option<NaiveDate>,
    pub post_weeks: u32,
    pub market_pre: f64,
    pub market_during: f64,
    pub market_growth: f64,
    pub internal_lift: f64,
    pub lost_sales: f64,
    pub total_effect: f64,
    pub share_internal: Option<f64>,
    pub share_lost: Option<f64>,
    pub substitutes_count: usize,
    pub substitutes_with_lift: usize,
    pub lift_same_nfc1: f64,
    pub lift_diff_nfc1: f64,
    pub share_same_nfc1: Option<f64>,
    pub share_diff_nfc1: Option<f64>,
}

impl CsvRow for DidResultRow {
    const HEADERS: &'static [&'static str] = &[
        "EVENT_ID",
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "DRUGS_ID",
        "DRUGS_NAME",
        "NFC1_ID",
        "STOCKOUT_START",
        "STOCKOUT_END",
        "STOCKOUT_WEEKS",
        "PRE_AVG_Q",
        "POST_START",
        "POST_END",
        "POST_WEEKS",
        "MARKET_PRE",
        "MARKET_DURING",
        "MARKET_GROWTH",
        "INTERNAL_LIFT",
        "LOST_SALES",
        "TOTAL_EFFECT",
        "SHARE_INTERNAL",
        "SHARE_LOST",
        "SUBSTITUTES_COUNT",
        "SUBSTITUTES_WITH_LIFT",
        "LIFT_SAME_NFC1",
        "LIFT_DIFF_NFC1",
        "SHARE_SAME_NFC1",
        "SHARE_DIFF_NFC1",
    ];
}

impl From<&StockoutEvent> for DidResultRow {
    fn from(s: &StockoutEvent) -> Self {
        let e = &s.event;
        let d = &s.did;
        Self {
            event_id: e.event_id.to_string(),
            client_id: e.market_id.get(),
            inn_id: e.ingredient_id.get(),
            inn_name: e.ingredient_name.clone(),
            drugs_id: e.drug_id.get(),
            drugs_name: e.drug_name.clone(),
            nfc1_id: e.nfc1.clone(),
            stockout_start: e.period.start.date(),
            stockout_end: e.period.end.date(),
            stockout_weeks: e.period.weeks,
            pre_avg_q: e.pre.avg_quantity,
            post_start: s.post.window.map(|w| w.start.date()),
            post_end: s.post.window.map(|w| w.end.date()),
            post_weeks: s.post.weeks,
            market_pre: d.market_pre,
            market_during: d.market_during,
            market_growth: d.market_growth,
            internal_lift: d.internal_lift,
            lost_sales: d.lost_sales,
            total_effect: d.total_effect,
            share_internal: d.share_internal,
            share_lost: d.share_lost,
            substitutes_count: d.substitutes_count,
            substitutes_with_lift: d.substitutes_with_lift,
            lift_same_nfc1: d.lift_same_nfc1,
            lift_diff_nfc1: d.lift_diff_nfc1,
            share_same_nfc1: d.share_same_nfc1,
            share_diff_nfc1: d.share_diff_nfc1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstituteMappingRow {
    pub event_id: String,
    pub client_id: i64,
    pub inn_id: i64,
    pub inn_name: String,
    pub target_drugs_id: i64,
    pub target_drugs_name: String,
    pub target_nfc1_id: String,
    pub substitute_drugs_id: i64,
    pub substitute_drugs_name: String,
    pub substitute_nfc1_id: String,
    pub same_nfc1: bool,
    pub nfc_group: &'static str,
}

impl CsvRow for SubstituteMappingRow {
    const HEADERS: &'static [&'static str] = &[
        "EVENT_ID",
        "CLIENT_ID",
        "INN_ID",
        "INN_NAME",
        "TARGET_DRUGS_ID",
        "TARGET_DRUGS_NAME",
        "TARGET_NFC1_ID",
        "SUBSTITUTE_DRUGS_ID",
        "SUBSTITUTE_DRUGS_NAME",
        "SUBSTITUTE_NFC1_ID",
        "SAME_NFC1",
        "NFC_GROUP",
    ];
}

impl SubstituteMappingRow {
    pub fn new(event: &ValidatedEvent, candidate: &SubstituteCandidate) -> Self {
        Self {
            event_id: candidate.event_id.to_string(),
            client_id: event.market_id.get(),
            inn_id: event.ingredient_id.get(),
            inn_name: event.ingredient_name.clone(),
            target_drugs_id: event.drug_id.get(),
            target_drugs_name: event.drug_name.clone(),
            target_nfc1_id: event.nfc1.clone(),
            substitute_drugs_id: candidate.drug_id.get(),
            substitute_drugs_name: candidate.drug_name.clone(),
            substitute_nfc1_id: candidate.nfc1.clone(),
            same_nfc1: candidate.same_nfc1,
            nfc_group: candidate.group.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DidSummaryRow {
    pub inn_id: i64,
    pub inn_name: String,
    pub events: usize,
    pub drugs: usize,
    pub avg_share_internal: Option<f64>,
    pub avg_share_lost: Option<f64>,
    pub avg_share_same_nfc1: Option<f64>,
    pub total_internal_lift: f64,
    pub total_lost_sales: f64,
}

impl CsvRow for DidSummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "INN_ID",
        "INN_NAME",
        "EVENTS",
        "DRUGS",
        "AVG_SHARE_INTERNAL",
        "AVG_SHARE_LOST",
        "AVG_SHARE_SAME_NFC1",
        "TOTAL_INTERNAL_LIFT",
        "TOTAL_LOST_SALES",
    ];
}

impl From<&IngredientDidSummary> for DidSummaryRow {
    fn from(s: &IngredientDidSummary) -> Self {
        Self {
            inn_id: s.ingredient_id.get(),
            inn_name: s.ingredient_name.clone(),
            events: s.events,
            drugs: s.drugs,
            avg_share_internal: s.avg_share_internal,
            avg_share_lost: s.avg_share_lost,
            avg_share_same_nfc1: s.avg_share_same_nfc1,
            total_internal_lift: s.total_internal_lift,
            total_lost_sales: s.total_lost_sales,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DrugSummaryRow {
    pub drugs_id: i64,
    pub drugs_name: String,
    pub inn_id: i64,
    pub inn_name: String,
    pub nfc1_id: String,
    pub events_count: usize,
    pub share_internal: Option<f64>,
    pub share_lost: Option<f64>,
    pub share_same_nfc1: Option<f64>,
    pub share_diff_nfc1: Option<f64>,
    pub internal_lift: f64,
    pub lost_sales: f64,
    pub total_effect: f64,
    pub avg_stockout_weeks: f64,
    pub classification: &'static str,
    pub recommendation: &'static str,
}

impl CsvRow for DrugSummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "DRUGS_ID",
        "DRUGS_NAME",
        "INN_ID",
        "INN_NAME",
        "NFC1_ID",
        "EVENTS_COUNT",
        "SHARE_INTERNAL",
        "SHARE_LOST",
        "SHARE_SAME_NFC1",
        "SHARE_DIFF_NFC1",
        "INTERNAL_LIFT",
        "LOST_SALES",
        "TOTAL_EFFECT",
        "AVG_STOCKOUT_WEEKS",
        "CLASSIFICATION",
        "RECOMMENDATION",
    ];
}

impl From<&DrugSummary> for DrugSummaryRow {
    fn from(s: &DrugSummary) -> Self {
        Self {
            drugs_id: s.drug_id.get(),
            drugs_name: s.drug_name.clone(),
            inn_id: s.ingredient_id.get(),
            inn_name: s.ingredient_name.clone(),
            nfc1_id: s.nfc1.clone(),
            events_count: s.events_count,
            share_internal: s.avg_share_internal,
            share_lost: s.avg_share_lost,
            share_same_nfc1: s.avg_share_same_nfc1,
            share_diff_nfc1: s.avg_share_diff_nfc1,
            internal_lift: s.total_internal_lift,
            lost_sales: s.total_lost_sales,
            total_effect: s.total_effect,
            avg_stockout_weeks: s.avg_stockout_weeks,
            classification: s.classification.as_str(),
            recommendation: s.classification.recommendation(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstituteShareRow {
    pub stockout_drug_id: i64,
    pub stockout_drug_name: String,
    pub substitute_drug_id: i64,
    pub substitute_drug_name: String,
    pub same_nfc1: bool,
    pub total_lift: f64,
    pub events_count: usize,
    pub internal_lift: f64,
    pub substitute_share: f64,
    pub lift_same_nfc1: f64,
    pub lift_diff_nfc1: f64,
}

impl CsvRow for SubstituteShareRow {
    const HEADERS: &'static [&'static str] = &[
        "STOCKOUT_DRUG_ID",
        "STOCKOUT_DRUG_NAME",
        "SUBSTITUTE_DRUG_ID",
        "SUBSTITUTE_DRUG_NAME",
        "SAME_NFC1",
        "TOTAL_LIFT",
        "EVENTS_COUNT",
        "INTERNAL_LIFT",
        "SUBSTITUTE_SHARE",
        "LIFT_SAME_NFC1",
        "LIFT_DIFF_NFC1",
    ];
}

impl From<&SubstituteShareRecord> for SubstituteShareRow {
    fn from(r: &SubstituteShareRecord) -> Self {
        Self {
            stockout_drug_id: r.stockout_drug_id.get(),
            stockout_drug_name: r.stockout_drug_name.clone(),
            substitute_drug_id: r.substitute_drug_id.get(),
            substitute_drug_name: r.substitute_drug_name.clone(),
            same_nfc1: r.same_nfc1,
            total_lift: r.total_lift,
            events_count: r.events_count,
            internal_lift: r.internal_lift,
            substitute_share: r.substitute_share,
            lift_same_nfc1: r.lift_same_nfc1,
            lift_diff_nfc1: r.lift_diff_nfc1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossMarketRow {
    pub client_id: i64,
    pub drugs_id: i64,
    pub drugs_name: String,
    pub inn_id: i64,
    pub inn_name: String,
    pub nfc1_id: String,
    pub events_count: usize,
    pub total_stockout_weeks: u32,
    pub first_stockout_date: NaiveDate,
    pub last_stockout_date: NaiveDate,
    pub internal_lift: f64,
    pub lost_sales: f64,
    pub total_effect: f64,
    pub total_lift_same_nfc1: f64,
    pub total_lift_diff_nfc1: f64,
    pub share_internal: Option<f64>,
    pub share_lost: Option<f64>,
    pub share_same_nfc1: f64,
    pub share_diff_nfc1: f64,
    pub classification: &'static str,
    pub recommendation: &'static str,
}

impl CsvRow for CrossMarketRow {
    const HEADERS: &'static [&'static str] = &[
        "CLIENT_ID",
        "DRUGS_ID",
        "DRUGS_NAME",
        "INN_ID",
        "INN_NAME",
        "NFC1_ID",
        "EVENTS_COUNT",
        "TOTAL_STOCKOUT_WEEKS",
        "FIRST_STOCKOUT_DATE",
        "LAST_STOCKOUT_DATE",
        "INTERNAL_LIFT",
        "LOST_SALES",
        "TOTAL_EFFECT",
        "TOTAL_LIFT_SAME_NFC1",
        "TOTAL_LIFT_DIFF_NFC1",
        "SHARE_INTERNAL",
        "SHARE_LOST",
        "SHARE_SAME_NFC1",
        "SHARE_DIFF_NFC1",
        "CLASSIFICATION",
        "RECOMMENDATION",
    ];
}

impl From<&CrossMarketDrugRow> for CrossMarketRow {
    fn from(r: &CrossMarketDrugRow) -> Self {
        Self {
            client_id: r.market_id.get(),
            drugs_id: r.drug_id.get(),
            drugs_name: r.drug_name.clone(),
            inn_id: r.ingredient_id.get(),
            inn_name: r.ingredient_name.clone(),
            nfc1_id: r.nfc1.clone(),
            events_count: r.events_count,
            total_stockout_weeks: r.total_stockout_weeks,
            first_stockout_date: r.first_stockout_start.date(),
            last_stockout_date: r.last_stockout_end.date(),
            internal_lift: r.internal_lift,
            lost_sales: r.lost_sales,
            total_effect: r.total_effect,
            total_lift_same_nfc1: r.total_lift_same_nfc1,
            total_lift_diff_nfc1: r.total_lift_diff_nfc1,
            share_internal: r.share_internal,
            share_lost: r.share_lost,
            share_same_nfc1: r.share_same_nfc1,
            share_diff_nfc1: r.share_diff_nfc1,
            classification: r.classification.as_str(),
            recommendation: r.recommendation(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DrugListRow {
    pub drugs_id: i64,
    pub drugs_name: String,
    pub inn_id: i64,
    pub inn_name: String,
}

impl CsvRow for DrugListRow {
    const HEADERS: &'static [&'static str] = &["DRUGS_ID", "DRUGS_NAME", "INN_ID", "INN_NAME"];
}

impl From<&DrugCatalogEntry> for DrugListRow {
    fn from(d: &DrugCatalogEntry) -> Self {
        Self {
            drugs_id: d.drug_id.get(),
            drugs_name: d.drug_name.clone(),
            inn_id: d.ingredient_id.get(),
            inn_name: d.ingredient_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchedDrugRow {
    pub drugs_id: i64,
    pub drugs_name: String,
    pub inn_id: i64,
    pub inn_name: String,
    pub nfc1_id: String,
    pub market_count: usize,
    pub total_markets: usize,
    pub market_coverage: f64,
    pub coverage_cluster: &'static str,
}

impl CsvRow for ResearchedDrugRow {
    const HEADERS: &'static [&'static str] = &[
        "DRUGS_ID",
        "DRUGS_NAME",
        "INN_ID",
        "INN_NAME",
        "NFC1_ID",
        "MARKET_COUNT",
        "TOTAL_MARKETS",
        "MARKET_COVERAGE",
        "COVERAGE_CLUSTER",
    ];
}

impl From<&ResearchedDrug> for ResearchedDrugRow {
    fn from(d: &ResearchedDrug) -> Self {
        Self {
            drugs_id: d.drug_id.get(),
            drugs_name: d.drug_name.clone(),
            inn_id: d.ingredient_id.get(),
            inn_name: d.ingredient_name.clone(),
            nfc1_id: d.nfc1.clone(),
            market_count: d.market_count,
            total_markets: d.total_markets,
            market_coverage: d.market_coverage,
            coverage_cluster: d.coverage_cluster.as_str(),
        }
    }
}
