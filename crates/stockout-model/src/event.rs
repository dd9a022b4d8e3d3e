//! Stock-out periods and the events built from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DrugId, EventId, IngredientId, PharmacyId};
use crate::substitute::SubstituteLift;
use crate::week::{Week, WeekRange};

/// Maximal run of zero-sales weeks for one drug at the target pharmacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockoutPeriod {
    pub drug_id: DrugId,
    pub start: Week,
    pub end: Week,
    pub weeks: u32,
}

impl StockoutPeriod {
    pub fn window(&self) -> WeekRange {
        WeekRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// Why a candidate period did not become an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No competitor sold anything in the ingredient group during the window.
    NoMarketActivity,
    /// Baseline too short or without sales.
    NoPreSales,
    /// No competitor sold this drug during the window.
    NoCompetitors,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 3] = [
        RejectionReason::NoMarketActivity,
        RejectionReason::NoPreSales,
        RejectionReason::NoCompetitors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::NoMarketActivity => "no_market_activity",
            RejectionReason::NoPreSales => "no_pre_sales",
            RejectionReason::NoCompetitors => "no_competitors",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Baseline window immediately before a stock-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrePeriod {
    pub window: WeekRange,
    /// Weeks of target data found inside the window.
    pub weeks: u32,
    pub total_quantity: f64,
    pub avg_quantity: f64,
}

/// A stock-out period that passed all validation gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedEvent {
    pub event_id: EventId,
    pub market_id: PharmacyId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub drug_id: DrugId,
    pub drug_name: String,
    pub nfc1: String,
    pub nfc2: String,
    pub period: StockoutPeriod,
    pub pre: PrePeriod,
    /// Ingredient-group competitor quantity during the stock-out window.
    pub market_during_quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Valid,
    NoRecovery,
    GapTooLarge,
    InsufficientData,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Valid => "valid",
            PostStatus::NoRecovery => "no_recovery",
            PostStatus::GapTooLarge => "gap_too_large",
            PostStatus::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery window after a stock-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostPeriod {
    pub status: PostStatus,
    /// Present only for [`PostStatus::Valid`].
    pub window: Option<WeekRange>,
    /// `min_post_weeks` when valid, the rows available when data was
    /// insufficient, otherwise 0.
    pub weeks: u32,
    /// Weeks between stock-out end and the recovery week, when one exists.
    pub gap_weeks: Option<i64>,
}

impl PostPeriod {
    pub fn is_valid(&self) -> bool {
        self.status == PostStatus::Valid
    }
}

/// Difference-in-differences result for one event.
///
/// Shares are `None` when the underlying total is below the share floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidMetrics {
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

/// Fully analysed event: validation, recovery and lift attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockoutEvent {
    pub event: ValidatedEvent,
    pub post: PostPeriod,
    pub did: DidMetrics,
    pub substitutes: Vec<SubstituteLift>,
}

impl StockoutEvent {
    pub fn event_id(&self) -> &EventId {
        &self.event.event_id
    }

    pub fn drug_id(&self) -> DrugId {
        self.event.drug_id
    }
}
