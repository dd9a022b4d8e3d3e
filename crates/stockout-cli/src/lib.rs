//! Library side of the `stockout` command line tool.

pub mod logging;
pub mod pipeline;
pub mod types;
