//! Per-market aggregates over analysed events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClassificationThresholds;
use crate::event::{PostStatus, RejectionReason};
use crate::ids::{DrugId, IngredientId};

/// Assortment classification of a stocked-out drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Critical,
    Moderate,
    Substitutable,
    Unknown,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Critical,
        Classification::Moderate,
        Classification::Substitutable,
        Classification::Unknown,
    ];

    pub fn classify(
        share_internal: Option<f64>,
        share_lost: Option<f64>,
        thresholds: &ClassificationThresholds,
    ) -> Self {
        match (share_internal, share_lost) {
            (Some(_), Some(lost)) if lost > thresholds.critical => Classification::Critical,
            (Some(internal), Some(_)) if internal > thresholds.substitutable => {
                Classification::Substitutable
            }
            (Some(_), Some(_)) => Classification::Moderate,
            _ => Classification::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Critical => "CRITICAL",
            Classification::Moderate => "MODERATE",
            Classification::Substitutable => "SUBSTITUTABLE",
            Classification::Unknown => "UNKNOWN",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Classification::Critical => "KEEP - High loss to competitors",
            Classification::Substitutable => "CONSIDER_REMOVAL - Good internal substitution",
            Classification::Moderate | Classification::Unknown => "ANALYZE - Mixed results",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome counts of the validation gates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCounters {
    pub raw: usize,
    pub valid: usize,
    pub no_market_activity: usize,
    pub no_pre_sales: usize,
    pub no_competitors: usize,
}

impl ValidationCounters {
    pub fn record(&mut self, outcome: Option<RejectionReason>) {
        self.raw += 1;
        match outcome {
            None => self.valid += 1,
            Some(RejectionReason::NoMarketActivity) => self.no_market_activity += 1,
            Some(RejectionReason::NoPreSales) => self.no_pre_sales += 1,
            Some(RejectionReason::NoCompetitors) => self.no_competitors += 1,
        }
    }

    pub fn rejected(&self, reason: RejectionReason) -> usize {
        match reason {
            RejectionReason::NoMarketActivity => self.no_market_activity,
            RejectionReason::NoPreSales => self.no_pre_sales,
            RejectionReason::NoCompetitors => self.no_competitors,
        }
    }

    pub fn merge(&mut self, other: &ValidationCounters) {
        self.raw += other.raw;
        self.valid += other.valid;
        self.no_market_activity += other.no_market_activity;
        self.no_pre_sales += other.no_pre_sales;
        self.no_competitors += other.no_competitors;
    }

    /// Valid share of raw candidates in percent, rounded to one decimal.
    pub fn validation_rate(&self) -> f64 {
        if self.raw == 0 {
            return 0.0;
        }
        round_to(self.valid as f64 / self.raw as f64 * 100.0, 1)
    }
}

/// Outcome counts of the post-period and DiD stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidCounters {
    pub valid: usize,
    pub no_recovery: usize,
    pub gap_too_large: usize,
    pub insufficient_data: usize,
    /// Events without a substitute; they still produce a result.
    pub no_substitutes: usize,
    pub no_effect: usize,
}

impl DidCounters {
    pub fn record_post(&mut self, status: PostStatus) {
        match status {
            PostStatus::Valid => {}
            PostStatus::NoRecovery => self.no_recovery += 1,
            PostStatus::GapTooLarge => self.gap_too_large += 1,
            PostStatus::InsufficientData => self.insufficient_data += 1,
        }
    }

    pub fn no_post_period(&self) -> usize {
        self.no_recovery + self.gap_too_large + self.insufficient_data
    }

    pub fn merge(&mut self, other: &DidCounters) {
        self.valid += other.valid;
        self.no_recovery += other.no_recovery;
        self.gap_too_large += other.gap_too_large;
        self.insufficient_data += other.insufficient_data;
        self.no_substitutes += other.no_substitutes;
        self.no_effect += other.no_effect;
    }
}

/// Per stocked-out drug aggregate across its events in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugSummary {
    pub drug_id: DrugId,
    pub drug_name: String,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub nfc1: String,
    pub events_count: usize,
    pub avg_share_internal: Option<f64>,
    pub avg_share_lost: Option<f64>,
    pub avg_share_same_nfc1: Option<f64>,
    pub avg_share_diff_nfc1: Option<f64>,
    pub total_internal_lift: f64,
    pub total_lost_sales: f64,
    pub total_effect: f64,
    pub avg_stockout_weeks: f64,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDidSummary {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub events: usize,
    pub drugs: usize,
    pub avg_share_internal: Option<f64>,
    pub avg_share_lost: Option<f64>,
    pub avg_share_same_nfc1: Option<f64>,
    pub total_internal_lift: f64,
    pub total_lost_sales: f64,
}

/// Mean of the defined values, `None` when there are none.
pub fn mean_defined(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_thresholds_are_strict() {
        let t = ClassificationThresholds::default();
        assert_eq!(Classification::classify(Some(0.55), Some(0.45), &t), Classification::Critical);
        assert_eq!(Classification::classify(Some(0.6), Some(0.4), &t), Classification::Moderate);
        assert_eq!(
            Classification::classify(Some(0.61), Some(0.39), &t),
            Classification::Substitutable
        );
        assert_eq!(Classification::classify(None, Some(0.9), &t), Classification::Unknown);
    }

    #[test]
    fn counters_track_reasons() {
        let mut counters = ValidationCounters::default();
        counters.record(None);
        counters.record(Some(RejectionReason::NoCompetitors));
        counters.record(Some(RejectionReason::NoCompetitors));
        assert_eq!(counters.raw, 3);
        assert_eq!(counters.valid, 1);
        assert_eq!(counters.rejected(RejectionReason::NoCompetitors), 2);
        assert_eq!(counters.validation_rate(), 33.3);
    }

    #[test]
    fn mean_skips_undefined() {
        assert_eq!(mean_defined([Some(1.0), None, Some(0.0)]), Some(0.5));
        assert_eq!(mean_defined([None, None]), None);
    }
}
