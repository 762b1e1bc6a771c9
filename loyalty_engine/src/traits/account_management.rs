use thiserror::Error;

use crate::db_types::{Account, AccountId, NewAccount};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Storage for user accounts. The engine never sees plaintext passwords at this level; only the hash is stored.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new account. Logins are unique, so a second account with the same login fails with
    /// [`AccountApiError::LoginTaken`].
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountApiError>;

    async fn fetch_account(&self, account_id: AccountId) -> Result<Option<Account>, AccountApiError>;

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<Account>, AccountApiError>;
}
