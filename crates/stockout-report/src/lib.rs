//! Export of analysis results.
//!
//! Every output is a flat table: comma-separated, upper snake case headers,
//! `YYYY-MM-DD` dates and empty cells for undefined shares.

mod common;
mod cross_market;
mod market;
mod metadata;
pub mod rows;

pub use common::{CsvRow, MetricPair, ensure_output_dir, write_csv};
pub use cross_market::{
    CROSS_MARKET_DIR, coefficient_headers, cross_market_dir, render_validation_report,
    write_cross_market_outputs, write_market_rows, write_validation_report,
};
pub use market::{MarketOutputs, PER_MARKET_DIR, write_market_outputs};
pub use metadata::{FailedMarket, MarketRunSummary, RunMetadata, write_run_metadata};
