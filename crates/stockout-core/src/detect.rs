//! Zero-run detection over a target drug series.

use stockout_model::{DrugId, StockoutPeriod, Week};
use stockout_transform::DrugSeries;

#[derive(Debug, Clone, Copy)]
enum RunState {
    /// Before the first observation.
    Start,
    Selling,
    OutOfStock { start: Week, last: Week, weeks: u32 },
}

/// Extracts maximal zero-sales runs of at least `min_weeks` weeks.
///
/// `weeks` must be contiguous and increasing. A run still open at the end
/// of the series closes on the last week.
pub fn detect_runs(
    drug_id: DrugId,
    weeks: impl IntoIterator<Item = (Week, f64)>,
    min_weeks: u32,
) -> Vec<StockoutPeriod> {
    let mut periods = Vec::new();
    let mut state = RunState::Start;
    let mut emit = |start: Week, end: Week, weeks: u32| {
        if weeks >= min_weeks {
            periods.push(StockoutPeriod {
                drug_id,
                start,
                end,
                weeks,
            });
        }
    };

    for (week, quantity) in weeks {
        state = match (state, quantity > 0.0) {
            (RunState::OutOfStock { start, last, weeks }, true) => {
                emit(start, last, weeks);
                RunState::Selling
            }
            (RunState::OutOfStock { start, weeks, .. }, false) => RunState::OutOfStock {
                start,
                last: week,
                weeks: weeks + 1,
            },
            (RunState::Start | RunState::Selling, true) => RunState::Selling,
            (RunState::Start | RunState::Selling, false) => RunState::OutOfStock {
                start: week,
                last: week,
                weeks: 1,
            },
        };
    }
    if let RunState::OutOfStock { start, last, weeks } = state {
        emit(start, last, weeks);
    }
    periods
}

pub fn detect_stockouts(drug: &DrugSeries, min_weeks: u32) -> Vec<StockoutPeriod> {
    detect_runs(
        drug.drug_id,
        drug.points.iter().map(|p| (p.week, p.quantity)),
        min_weeks,
    )
}
