//! Invariant and consistency checks over analysed markets.

pub mod checks;
pub mod issue;
pub mod report;

pub use checks::{MarketResults, run_all};
pub use issue::{Category, Issue, SharePair, Severity};
pub use report::{IssueRecord, ValidationReport};
