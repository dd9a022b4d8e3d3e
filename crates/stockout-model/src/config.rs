//! Analysis configuration.
//!
//! Every stage receives an [`AnalysisConfig`] by reference. Missing fields
//! in a serialized config fall back to the defaults below.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::coefficient::CoverageCluster;
use crate::error::{ModelError, Result};

pub const ORAL_SOLID: &str = "Пероральные твердые обычные";
pub const ORAL_LIQUID: &str = "Пероральные жидкие обычные";
pub const ORAL_SOLID_EXTENDED: &str = "Пероральные твердые длительно действующие";
pub const NON_MEDICAL: &str = "Не предназначенные для использования у человека и прочие";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub stockout: StockoutParams,
    pub coverage: CoverageThresholds,
    pub classification: ClassificationThresholds,
    pub compatibility: FormCompatibility,
}

impl AnalysisConfig {
    /// Check every threshold group; the first violation is returned.
    pub fn validate(&self) -> Result<()> {
        self.stockout.validate()?;
        self.coverage.validate()?;
        self.classification.validate()?;
        self.compatibility.validate()
    }
}

/// Thresholds for detection, validation, post-period and DiD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockoutParams {
    /// Shortest zero-sales run that counts as a stock-out.
    pub min_stockout_weeks: u32,
    pub min_pre_weeks: u32,
    pub min_post_weeks: u32,
    /// Largest allowed distance (weeks) between stock-out end and recovery.
    pub max_post_gap_weeks: u32,
    /// Post-window sales-week ratio for the diagnostic quality check.
    pub min_sales_weeks_ratio: f64,
    pub min_notsold_percent: f64,
    pub max_notsold_percent: f64,
    /// Pre-period competitor total below which market growth is neutral.
    pub min_market_pre: f64,
    /// Total effect below which shares are undefined.
    pub min_total_for_share: f64,
    /// Substitute pairs must sum strictly above this lift.
    pub min_total_lift: f64,
    pub invariant_tolerance: f64,
    /// Tolerance (percentage points) for per-drug substitute share sums.
    pub share_sum_tolerance: f64,
}

impl Default for StockoutParams {
    fn default() -> Self {
        Self {
            min_stockout_weeks: 1,
            min_pre_weeks: 4,
            min_post_weeks: 4,
            max_post_gap_weeks: 2,
            min_sales_weeks_ratio: 0.5,
            min_notsold_percent: 0.20,
            max_notsold_percent: 0.95,
            min_market_pre: 1.0,
            min_total_for_share: 0.001,
            min_total_lift: 0.0,
            invariant_tolerance: 0.001,
            share_sum_tolerance: 0.1,
        }
    }
}

impl StockoutParams {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("stockout.min_stockout_weeks", self.min_stockout_weeks),
            ("stockout.min_pre_weeks", self.min_pre_weeks),
            ("stockout.min_post_weeks", self.min_post_weeks),
        ] {
            if value < 1 {
                return Err(ModelError::config(field, "must be at least 1"));
            }
        }
        let (min, max) = (self.min_notsold_percent, self.max_notsold_percent);
        if !(0.0 < min && min < max && max < 1.0) {
            return Err(ModelError::config(
                "stockout.min_notsold_percent",
                format!("band must satisfy 0 < min < max < 1, got [{min}, {max}]"),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_sales_weeks_ratio) {
            return Err(ModelError::config(
                "stockout.min_sales_weeks_ratio",
                "must be within [0, 1]",
            ));
        }
        for (field, value) in [
            ("stockout.min_market_pre", self.min_market_pre),
            ("stockout.min_total_for_share", self.min_total_for_share),
            ("stockout.min_total_lift", self.min_total_lift),
            ("stockout.invariant_tolerance", self.invariant_tolerance),
            ("stockout.share_sum_tolerance", self.share_sum_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::config(field, format!("must be >= 0, got {value}")));
            }
        }
        Ok(())
    }
}

/// Ordinal cut-offs for market coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            high: 0.50,
            medium: 0.20,
            low: 0.10,
        }
    }
}

impl CoverageThresholds {
    fn validate(&self) -> Result<()> {
        if !(0.0 < self.low && self.low < self.medium && self.medium < self.high && self.high <= 1.0)
        {
            return Err(ModelError::config(
                "coverage",
                format!(
                    "thresholds must satisfy 0 < low < medium < high <= 1, got {}/{}/{}",
                    self.low, self.medium, self.high
                ),
            ));
        }
        Ok(())
    }

    pub fn cluster(&self, coverage: f64) -> CoverageCluster {
        if coverage >= self.high {
            CoverageCluster::High
        } else if coverage >= self.medium {
            CoverageCluster::Medium
        } else if coverage >= self.low {
            CoverageCluster::Low
        } else {
            CoverageCluster::Insufficient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// `share_lost` strictly above this marks a drug CRITICAL.
    pub critical: f64,
    /// `share_internal` strictly above this marks a drug SUBSTITUTABLE.
    pub substitutable: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            critical: 0.40,
            substitutable: 0.60,
        }
    }
}

impl ClassificationThresholds {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("classification.critical", self.critical),
            ("classification.substitutable", self.substitutable),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ModelError::config(field, format!("must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

/// Form categories that drive substitute compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormCompatibility {
    /// Mutually compatible oral forms.
    pub oral: BTreeSet<String>,
    /// Never compatible with anything, itself included.
    pub excluded: BTreeSet<String>,
}

impl Default for FormCompatibility {
    fn default() -> Self {
        Self {
            oral: [ORAL_SOLID, ORAL_LIQUID, ORAL_SOLID_EXTENDED]
                .into_iter()
                .map(str::to_string)
                .collect(),
            excluded: std::iter::once(NON_MEDICAL.to_string()).collect(),
        }
    }
}

impl FormCompatibility {
    fn validate(&self) -> Result<()> {
        if let Some(form) = self.oral.intersection(&self.excluded).next() {
            return Err(ModelError::config(
                "compatibility",
                format!("form '{form}' is both oral and excluded"),
            ));
        }
        Ok(())
    }

    pub fn is_oral(&self, form: &str) -> bool {
        self.oral.contains(form)
    }

    pub fn is_excluded(&self, form: &str) -> bool {
        self.excluded.contains(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AnalysisConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn rejects_inverted_notsold_band() {
        let mut config = AnalysisConfig::default();
        config.stockout.min_notsold_percent = 0.9;
        config.stockout.max_notsold_percent = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_notsold_percent"));
    }

    #[test]
    fn rejects_zero_pre_weeks() {
        let mut config = AnalysisConfig::default();
        config.stockout.min_pre_weeks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overlapping_form_sets() {
        let mut config = AnalysisConfig::default();
        config.compatibility.excluded.insert(ORAL_LIQUID.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"stockout": {"min_pre_weeks": 6}}"#).unwrap();
        assert_eq!(config.stockout.min_pre_weeks, 6);
        assert_eq!(config.stockout.min_post_weeks, 4);
        assert_eq!(config.coverage, CoverageThresholds::default());
    }

    #[test]
    fn coverage_clusters_are_ordered() {
        let thresholds = CoverageThresholds::default();
        assert_eq!(thresholds.cluster(0.5), CoverageCluster::High);
        assert_eq!(thresholds.cluster(0.49), CoverageCluster::Medium);
        assert_eq!(thresholds.cluster(0.1), CoverageCluster::Low);
        assert_eq!(thresholds.cluster(0.0999), CoverageCluster::Insufficient);
    }
}
