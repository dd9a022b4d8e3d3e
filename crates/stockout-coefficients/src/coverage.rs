//! Coverage metrics and consistency checks of the cross-market build.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use stockout_model::{CoverageCluster, PharmacyId, round_to};

use crate::builder::{CoefficientTable, ResearchedDrug};

/// Headline coverage figures of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    pub total_markets: usize,
    pub total_drugs_raw: usize,
    pub total_drugs_researched: usize,
    /// Researched over raw drugs, 4 decimals.
    pub raw_coverage_rate: f64,
    pub drugs_by_cluster: BTreeMap<CoverageCluster, usize>,
    /// Absent when nothing was researched.
    pub avg_markets_per_drug: Option<f64>,
    pub avg_market_coverage: Option<f64>,
}

/// A `METRIC`/`VALUE` pair as exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

impl CoverageMetrics {
    pub fn compute(
        total_markets: usize,
        total_drugs_raw: usize,
        researched: &[ResearchedDrug],
    ) -> Self {
        let mut drugs_by_cluster: BTreeMap<CoverageCluster, usize> =
            CoverageCluster::ALL.iter().map(|c| (*c, 0)).collect();
        for drug in researched {
            *drugs_by_cluster.entry(drug.coverage_cluster).or_default() += 1;
        }
        let count = researched.len();
        let mean = |value: fn(&ResearchedDrug) -> f64| {
            (count > 0).then(|| researched.iter().map(value).sum::<f64>() / count as f64)
        };
        Self {
            total_markets,
            total_drugs_raw,
            total_drugs_researched: count,
            raw_coverage_rate: if total_drugs_raw == 0 {
                0.0
            } else {
                round_to(count as f64 / total_drugs_raw as f64, 4)
            },
            drugs_by_cluster,
            avg_markets_per_drug: mean(|d| d.market_count as f64).map(|v| round_to(v, 2)),
            avg_market_coverage: mean(|d| d.market_coverage).map(|v| round_to(v, 4)),
        }
    }

    pub fn cluster_count(&self, cluster: CoverageCluster) -> usize {
        self.drugs_by_cluster.get(&cluster).copied().unwrap_or_default()
    }

    pub fn rows(&self) -> Vec<MetricRow> {
        let mut rows = vec![
            metric("TOTAL_MARKETS", self.total_markets),
            metric("TOTAL_DRUGS_RAW", self.total_drugs_raw),
            metric("TOTAL_DRUGS_RESEARCHED", self.total_drugs_researched),
            metric("RAW_COVERAGE_RATE", self.raw_coverage_rate),
        ];
        for cluster in CoverageCluster::ALL {
            rows.push(metric(
                &format!("DRUGS_{cluster}_COVERAGE"),
                self.cluster_count(cluster),
            ));
        }
        if let Some(value) = self.avg_markets_per_drug {
            rows.push(metric("AVG_MARKETS_PER_DRUG", value));
        }
        if let Some(value) = self.avg_market_coverage {
            rows.push(metric("AVG_MARKET_COVERAGE", value));
        }
        rows
    }
}

fn metric(name: &str, value: impl fmt::Display) -> MetricRow {
    MetricRow {
        metric: name.to_string(),
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Ok => "[OK]",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCheck {
    pub status: CheckStatus,
    pub name: String,
    pub message: String,
}

impl fmt::Display for CoverageCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status.label(), self.name, self.message)
    }
}

fn check(status: CheckStatus, name: &str, message: String) -> CoverageCheck {
    CoverageCheck {
        status,
        name: name.to_string(),
        message,
    }
}

fn pass_or_fail(ok: bool) -> CheckStatus {
    if ok { CheckStatus::Ok } else { CheckStatus::Fail }
}

/// Rows whose reported market count is compared with their filled cells.
const MARKET_COUNT_SAMPLE: usize = 5;

/// Consistency checks over the built outputs.
///
/// The triangle check only warns; everything else fails.
pub fn check_coverage(
    processed: &[PharmacyId],
    metrics: &CoverageMetrics,
    researched: &[ResearchedDrug],
    table: &CoefficientTable,
) -> Vec<CoverageCheck> {
    let mut checks = Vec::new();

    // 1. Market total
    checks.push(check(
        pass_or_fail(metrics.total_markets == processed.len()),
        "TOTAL_MARKETS",
        format!("{} reported, {} processed", metrics.total_markets, processed.len()),
    ));

    // 2. Cluster counts
    let cluster_sum: usize = metrics.drugs_by_cluster.values().sum();
    checks.push(check(
        pass_or_fail(cluster_sum == researched.len()),
        "COVERAGE_CLUSTERS",
        format!("{cluster_sum} clustered, {} researched", researched.len()),
    ));

    // 3. Share range
    let shares: Vec<f64> = table
        .rows
        .iter()
        .flat_map(|row| row.cells.values().filter_map(|cell| cell.share_internal))
        .collect();
    let out_of_range = shares.iter().filter(|s| !(0.0..=1.0).contains(*s)).count();
    checks.push(check(
        pass_or_fail(out_of_range == 0),
        "SHARE_INTERNAL",
        format!("{out_of_range} of {} values outside [0, 1]", shares.len()),
    ));

    // 4. Triangle
    let filled = table.filled_counts();
    if let [first, second, ..] = filled.as_slice() {
        let status = if first >= second {
            CheckStatus::Ok
        } else {
            CheckStatus::Warn
        };
        checks.push(check(
            status,
            "TRIANGLE_STRUCTURE",
            format!("first row fills {first} markets, second {second}"),
        ));
    }

    // 5. Market set
    let expected: BTreeSet<PharmacyId> = processed.iter().copied().collect();
    let actual: BTreeSet<PharmacyId> = table.markets.iter().copied().collect();
    let missing: Vec<String> = expected.difference(&actual).map(ToString::to_string).collect();
    let extra: Vec<String> = actual.difference(&expected).map(ToString::to_string).collect();
    checks.push(check(
        pass_or_fail(missing.is_empty() && extra.is_empty()),
        "MARKET_MATCH",
        format!(
            "{} markets in table, missing [{}], extra [{}]",
            actual.len(),
            missing.join(", "),
            extra.join(", ")
        ),
    ));

    // 6. Market counts
    for row in table.rows.iter().take(MARKET_COUNT_SAMPLE) {
        let filled = row.defined_shares();
        checks.push(check(
            pass_or_fail(filled == row.market_count),
            &format!("MARKET_COUNT drug {}", row.drug_id),
            format!("{filled} filled, {} reported", row.market_count),
        ));
    }

    checks
}

pub fn checks_passed(checks: &[CoverageCheck]) -> bool {
    checks.iter().all(|c| c.status != CheckStatus::Fail)
}
