//! Weekly series preparation.
//!
//! - **normalize**: gap filling per (pharmacy, drug) key
//! - **aggregate**: target/competitor split, not-sold filter, competitor totals
//! - **series**: the per-group series read by every later stage

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod series;

pub use aggregate::{
    DrugSeriesStats, IngredientSeriesSummary, MarketSeries, aggregate_market, notsold_percent,
};
pub use error::{Result, TransformError};
pub use normalize::{normalize_observations, normalize_series};
pub use series::{DrugSeries, IngredientSeries, SeriesPoint};
