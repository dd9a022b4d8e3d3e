//! Validation gates for candidate stock-out periods.
//!
//! Gates run in a fixed order and the first failure is the reported reason:
//! market activity (whole ingredient group), pre-period sales (this drug),
//! competitor availability (this drug).

use stockout_model::{PrePeriod, RejectionReason, StockoutParams, StockoutPeriod, WeekRange};
use stockout_transform::{DrugSeries, IngredientSeries};

/// Figures computed while a candidate passes every gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassedGates {
    pub pre: PrePeriod,
    pub market_during_quantity: f64,
}

/// Baseline window ending the week before the stock-out starts.
pub fn pre_period_window(period: &StockoutPeriod, min_pre_weeks: u32) -> WeekRange {
    WeekRange::ending_at(period.start.previous(), min_pre_weeks)
}

pub fn check_gates(
    group: &IngredientSeries,
    drug: &DrugSeries,
    period: &StockoutPeriod,
    params: &StockoutParams,
) -> Result<PassedGates, RejectionReason> {
    let during = period.window();

    let market_during_quantity = group.market_quantity_in(during);
    if market_during_quantity <= 0.0 {
        return Err(RejectionReason::NoMarketActivity);
    }

    let window = pre_period_window(period, params.min_pre_weeks);
    let (weeks, total_quantity) = drug
        .points_in(window)
        .fold((0u32, 0.0), |(weeks, total), p| (weeks + 1, total + p.quantity));
    if weeks < params.min_pre_weeks || total_quantity <= 0.0 {
        return Err(RejectionReason::NoPreSales);
    }

    if drug.market_quantity_in(during) <= 0.0 {
        return Err(RejectionReason::NoCompetitors);
    }

    Ok(PassedGates {
        pre: PrePeriod {
            window,
            weeks,
            total_quantity,
            avg_quantity: total_quantity / f64::from(weeks),
        },
        market_during_quantity,
    })
}
