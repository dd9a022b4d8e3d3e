use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("{date} is not a Monday")]
    NotMonday { date: NaiveDate },
    #[error("window ends before it starts: {start} > {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("{0}")]
    Message(String),
}

impl ModelError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
