use serde::{Deserialize, Serialize};
use stockout_model::PharmacyId;

use crate::issue::{Issue, Severity};

/// Issues found for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub market_id: PharmacyId,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new(market_id: PharmacyId) -> Self {
        Self {
            market_id,
            issues: Vec::new(),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == severity)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Flat rows for export.
    pub fn records(&self) -> Vec<IssueRecord> {
        self.issues
            .iter()
            .map(|issue| IssueRecord {
                market_id: self.market_id.get(),
                rule_id: issue.rule_id().to_string(),
                severity: issue.severity().label().to_string(),
                category: issue.category().label().to_string(),
                subject: issue.subject(),
                message: issue.message(),
            })
            .collect()
    }
}

/// One exported issue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct IssueRecord {
    pub market_id: i64,
    pub rule_id: String,
    pub severity: String,
    pub category: String,
    pub subject: String,
    pub message: String,
}
