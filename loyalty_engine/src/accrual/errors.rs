use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("The accrual authority has no record of order {0}")]
    NotRegistered(String),
    #[error("The accrual authority is rate limiting requests. Retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
    #[error("The accrual authority returned {status}. {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("Could not reach the accrual authority. {0}")]
    Transport(String),
    #[error("The accrual authority sent a response we could not understand. {0}")]
    InvalidResponse(String),
    #[error("Invalid accrual authority configuration. {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for AccrualError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AccrualError::InvalidResponse(e.to_string())
        } else {
            AccrualError::Transport(e.to_string())
        }
    }
}
