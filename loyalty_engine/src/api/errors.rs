use thiserror::Error;

use crate::{helpers::PasswordError, traits::AccountApiError};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Invalid registration details. {0}")]
    InvalidInput(String),
    #[error("Password processing failed. {0}")]
    PasswordError(String),
}

impl From<AccountApiError> for AuthApiError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => Self::DatabaseError(s),
            AccountApiError::LoginTaken(login) => Self::LoginTaken(login),
        }
    }
}

impl From<PasswordError> for AuthApiError {
    fn from(e: PasswordError) -> Self {
        Self::PasswordError(e.to_string())
    }
}
