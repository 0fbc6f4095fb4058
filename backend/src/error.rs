use axum::http::StatusCode;
use thiserror::Error;

/// Caller-facing error taxonomy for the matching and settlement engine.
///
/// `Validation` and `InsufficientBalance` are business rejections raised
/// before (or instead of) any write. `Internal` wraps infrastructure
/// failures from the stores. `Critical` is reserved for the one state the
/// engine cannot recover from on its own: a charge succeeded, the dependent
/// write failed, and the compensating refund failed too. It is never retried
/// automatically and is surfaced to callers as a generic internal error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("insufficient token balance: current {balance}, required {required}")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    #[error("token state for user {user_id} may be inconsistent: {context}")]
    Critical {
        user_id: String,
        amount: i64,
        context: String,
    },
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Internal(_) | CoreError::Critical { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to API callers. Critical details stay in the
    /// logs for operators; the caller only learns that something went wrong.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::Critical { .. } => {
                "Internal error while processing tokens. Please try again.".to_string()
            }
            CoreError::Internal(_) => "Internal server error.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
