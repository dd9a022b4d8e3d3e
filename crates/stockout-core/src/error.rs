use stockout_model::{IngredientId, ModelError, PharmacyId};
use stockout_transform::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("market {market_id}: {source}")]
    Transform {
        market_id: PharmacyId,
        #[source]
        source: TransformError,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("ingredient group {ingredient_id} of market {market_id} failed: {message}")]
    GroupFailed {
        market_id: PharmacyId,
        ingredient_id: IngredientId,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
