//! Stock-out detection and substitution attribution for one market.
//!
//! - **detect**: zero-sales runs at the target pharmacy
//! - **gates**: market activity, pre-period and competitor checks
//! - **post**: recovery window resolution
//! - **substitutes** / **compat**: compatible in-market alternatives
//! - **did**: difference-in-differences lift and loss
//! - **shares**: per-substitute shares of internal lift
//! - **market**: the per-market driver, fanned out over ingredient groups

pub mod compat;
pub mod detect;
pub mod did;
pub mod error;
pub mod fanout;
pub mod gates;
pub mod market;
pub mod post;
pub mod shares;
pub mod substitutes;
pub mod summary;

pub use compat::{compatibility_group, is_compatible};
pub use detect::{detect_runs, detect_stockouts};
pub use did::{DidOutcome, calculate_lift, compute_did, expected_sales, market_growth, split_shares};
pub use error::{CoreError, Result};
pub use fanout::{UnitOutcome, fan_out};
pub use gates::{PassedGates, check_gates, pre_period_window};
pub use market::{
    GroupAnalysis, GroupFailure, MarketAnalysis, ResolvedEvent, analyze_group, analyze_market,
};
pub use post::{check_post_sales_ratio, resolve_post_period};
pub use shares::{
    ShareAggregation, ShareMetadata, ShareSummary, aggregate_substitute_shares, share_sums,
    summarize_shares,
};
pub use substitutes::find_substitutes;
pub use summary::{
    DidMetadata, IngredientStockoutStats, StockoutSummary, ingredient_stats, summarize_drugs,
    summarize_ingredients,
};
