use stockout_model::{DrugId, PharmacyId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("series for pharmacy {pharmacy_id}, drug {drug_id} has no observations")]
    EmptySeries {
        pharmacy_id: PharmacyId,
        drug_id: DrugId,
    },
    #[error("target pharmacy {market_id} has no sales records")]
    NoTargetRecords { market_id: PharmacyId },
}

pub type Result<T> = std::result::Result<T, TransformError>;
