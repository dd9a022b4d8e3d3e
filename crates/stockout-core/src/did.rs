//! Difference-in-differences lift attribution.
//!
//! Expected sales scale a series' pre-period volume by the ingredient
//! group's competitor growth; lift is whatever was sold above that.

use stockout_model::{
    DidMetrics, StockoutParams, SubstituteCandidate, SubstituteLift, ValidatedEvent,
};
use stockout_transform::IngredientSeries;

/// Competitor growth from the pre window to the stock-out window.
///
/// Neutral (1.0) when the pre-period total is below `min_market_pre`.
pub fn market_growth(market_pre: f64, market_during: f64, min_market_pre: f64) -> f64 {
    if market_pre < min_market_pre {
        return 1.0;
    }
    (market_during / market_pre).max(0.0)
}

pub fn expected_sales(sales_pre: f64, growth: f64) -> f64 {
    (sales_pre * growth).max(0.0)
}

pub fn calculate_lift(actual: f64, expected: f64) -> f64 {
    (actual - expected).max(0.0)
}

/// `(share_a, share_b)` of `a + b`, undefined below `min_total`.
pub fn split_shares(a: f64, b: f64, min_total: f64) -> (Option<f64>, Option<f64>) {
    let total = a + b;
    if total < min_total {
        return (None, None);
    }
    (Some(a / total), Some(b / total))
}

/// Lift metrics of one event plus its per-substitute breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct DidOutcome {
    pub metrics: DidMetrics,
    pub substitutes: Vec<SubstituteLift>,
}

impl DidOutcome {
    pub fn has_effect(&self, params: &StockoutParams) -> bool {
        self.metrics.total_effect >= params.min_total_for_share
    }
}

pub fn compute_did(
    group: &IngredientSeries,
    event: &ValidatedEvent,
    candidates: &[SubstituteCandidate],
    params: &StockoutParams,
) -> DidOutcome {
    let pre = event.pre.window;
    let during = event.period.window();

    let market_pre = group.market_quantity_in(pre);
    let market_during = group.market_quantity_in(during);
    let growth = market_growth(market_pre, market_during, params.min_market_pre);

    let substitutes: Vec<SubstituteLift> = candidates
        .iter()
        .filter_map(|candidate| {
            let drug = group.drug(candidate.drug_id)?;
            let sales_pre = drug.quantity_in(pre);
            let sales_during = drug.quantity_in(during);
            let expected = expected_sales(sales_pre, growth);
            Some(SubstituteLift {
                drug_id: candidate.drug_id,
                drug_name: candidate.drug_name.clone(),
                nfc1: candidate.nfc1.clone(),
                same_nfc1: candidate.same_nfc1,
                sales_pre,
                sales_during,
                expected,
                lift: calculate_lift(sales_during, expected),
            })
        })
        .collect();

    let lift_same_nfc1: f64 = substitutes
        .iter()
        .filter(|s| s.same_nfc1)
        .map(|s| s.lift)
        .sum();
    let lift_diff_nfc1: f64 = substitutes
        .iter()
        .filter(|s| !s.same_nfc1)
        .map(|s| s.lift)
        .sum();
    let internal_lift = lift_same_nfc1 + lift_diff_nfc1;

    let lost_sales = group.drug(event.drug_id).map_or(0.0, |drug| {
        let expected = expected_sales(drug.market_quantity_in(pre), growth);
        calculate_lift(drug.market_quantity_in(during), expected)
    });
    let total_effect = internal_lift + lost_sales;

    let (share_internal, share_lost) =
        split_shares(internal_lift, lost_sales, params.min_total_for_share);
    let (share_same_nfc1, share_diff_nfc1) = if internal_lift > 0.0 {
        (
            Some(lift_same_nfc1 / internal_lift),
            Some(lift_diff_nfc1 / internal_lift),
        )
    } else {
        (None, None)
    };

    DidOutcome {
        metrics: DidMetrics {
            market_pre,
            market_during,
            market_growth: growth,
            internal_lift,
            lost_sales,
            total_effect,
            share_internal,
            share_lost,
            substitutes_count: substitutes.len(),
            substitutes_with_lift: substitutes.iter().filter(|s| s.lift > 0.0).count(),
            lift_same_nfc1,
            lift_diff_nfc1,
            share_same_nfc1,
            share_diff_nfc1,
        },
        substitutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lift_is_floored_at_zero() {
        assert_eq!(calculate_lift(50.0, 100.0), 0.0);
        assert_eq!(calculate_lift(150.0, 100.0), 50.0);
    }

    #[test]
    fn growth_is_neutral_below_floor() {
        assert_eq!(market_growth(0.5, 1000.0, 1.0), 1.0);
        assert_eq!(market_growth(200.0, 150.0, 1.0), 0.75);
        assert_eq!(market_growth(10.0, -5.0, 1.0), 0.0);
    }

    #[test]
    fn shares_undefined_without_effect() {
        assert_eq!(split_shares(0.0, 0.0005, 0.001), (None, None));
        assert_eq!(split_shares(1.0, 3.0, 0.001), (Some(0.25), Some(0.75)));
    }
}
