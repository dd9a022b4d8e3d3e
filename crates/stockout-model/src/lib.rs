//! Core records and configuration for stock-out substitution analysis.

pub mod coefficient;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod observation;
pub mod substitute;
pub mod summary;
pub mod week;

pub use coefficient::{CoverageCluster, CrossMarketCoefficient, MarketCell};
pub use config::{
    AnalysisConfig, ClassificationThresholds, CoverageThresholds, FormCompatibility,
    StockoutParams,
};
pub use error::{ModelError, Result};
pub use event::{
    DidMetrics, PostPeriod, PostStatus, PrePeriod, RejectionReason, StockoutEvent,
    StockoutPeriod, ValidatedEvent,
};
pub use ids::{DrugId, EventId, IngredientId, PharmacyId};
pub use observation::{DrugAttributes, RawObservation, WeeklyObservation};
pub use substitute::{
    CompatibilityGroup, SubstituteCandidate, SubstituteLift, SubstituteShareRecord,
};
pub use summary::{
    Classification, DidCounters, DrugSummary, IngredientDidSummary, ValidationCounters,
    mean_defined, round_to,
};
pub use week::{Week, WeekRange};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_is_zero_padded() {
        let id = EventId::new(PharmacyId::new(42), IngredientId::new(7), 3);
        assert_eq!(id.as_str(), "42_7_0003");
        assert_eq!(EventId::parse("42_7_0003").unwrap(), id);
    }

    #[test]
    fn event_id_rejects_garbage() {
        assert!(EventId::parse("42_7").is_err());
        assert!(EventId::parse("a_b_c").is_err());
    }
}
