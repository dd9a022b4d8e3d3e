//! Recovery window after a validated stock-out.

use stockout_model::{PostPeriod, PostStatus, StockoutParams, Week, WeekRange};
use stockout_transform::DrugSeries;

fn rejected(status: PostStatus, weeks: u32, gap_weeks: Option<i64>) -> PostPeriod {
    PostPeriod {
        status,
        window: None,
        weeks,
        gap_weeks,
    }
}

/// Finds the post-period following `stockout_end`.
///
/// The window is exactly `min_post_weeks` rows starting at the first week
/// with sales; it is never extended through a longer recovery.
pub fn resolve_post_period(
    drug: &DrugSeries,
    stockout_end: Week,
    params: &StockoutParams,
) -> PostPeriod {
    let Some(recovery) = drug
        .points_after(stockout_end)
        .find(|p| p.quantity > 0.0)
        .map(|p| p.week)
    else {
        return rejected(PostStatus::NoRecovery, 0, None);
    };

    let gap_weeks = recovery.weeks_since(stockout_end);
    if gap_weeks > i64::from(params.max_post_gap_weeks) {
        return rejected(PostStatus::GapTooLarge, 0, Some(gap_weeks));
    }

    let available: Vec<Week> = drug
        .points
        .iter()
        .filter(|p| p.week >= recovery)
        .map(|p| p.week)
        .collect();
    let min_post = params.min_post_weeks as usize;
    let end = match available.get(min_post.saturating_sub(1)) {
        Some(&end) if available.len() >= min_post => end,
        _ => {
            let weeks = u32::try_from(available.len()).unwrap_or(u32::MAX);
            return rejected(PostStatus::InsufficientData, weeks, Some(gap_weeks));
        }
    };
    PostPeriod {
        status: PostStatus::Valid,
        window: Some(WeekRange {
            start: recovery,
            end,
        }),
        weeks: params.min_post_weeks,
        gap_weeks: Some(gap_weeks),
    }
}

/// Whether the share of sales weeks in a valid post window reaches
/// `min_sales_weeks_ratio`. `None` when there is no window.
///
/// Diagnostic only; events are never gated on it.
pub fn check_post_sales_ratio(
    drug: &DrugSeries,
    post: &PostPeriod,
    params: &StockoutParams,
) -> Option<bool> {
    let window = post.window?;
    let (weeks, sold) = drug
        .points_in(window)
        .fold((0usize, 0usize), |(weeks, sold), p| {
            (weeks + 1, sold + usize::from(p.quantity > 0.0))
        });
    if weeks == 0 {
        return Some(false);
    }
    Some(sold as f64 / weeks as f64 >= params.min_sales_weeks_ratio)
}
