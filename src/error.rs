use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or range
    #[error("{0}")]
    Validation(String),

    #[error("insufficient balance: requested {requested} day(s), available {available}, short by {shortfall}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// Duplicate attendance key or overlapping request
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl Error {
    pub(crate) fn insufficient(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            requested,
            available,
            shortfall: requested - available,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
