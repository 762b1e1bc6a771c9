//! Account registration and credential checks.
use std::fmt::Debug;

use log::*;
use tokio::task;

use crate::{
    api::errors::AuthApiError,
    db_types::{Account, NewAccount},
    helpers::{hash_password, verify_password},
    traits::AccountManagement,
};

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new account. The login is trimmed and must not be empty, and the password must not be empty.
    pub async fn register(&self, login: &str, password: &str) -> Result<Account, AuthApiError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AuthApiError::InvalidInput("login must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthApiError::InvalidInput("password must not be empty".into()));
        }
        let password = password.to_string();
        // Argon2 is deliberately slow, so keep it off the async worker threads.
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthApiError::PasswordError(e.to_string()))??;
        let account = self.db.create_account(NewAccount { login: login.to_string(), password_hash }).await?;
        info!("🔑️ Registered account {} for '{}'", account.id, account.login);
        Ok(account)
    }

    /// Returns the account if `password` matches. Unknown logins and wrong passwords produce the same error.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Account, AuthApiError> {
        let account = match self.db.fetch_account_by_login(login.trim()).await? {
            Some(account) => account,
            None => {
                debug!("🔑️ Login attempt for unknown account '{login}'");
                return Err(AuthApiError::InvalidCredentials);
            },
        };
        let password = password.to_string();
        let stored = account.password_hash.clone();
        let matches = task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthApiError::PasswordError(e.to_string()))??;
        if matches {
            debug!("🔑️ '{}' authenticated", account.login);
            Ok(account)
        } else {
            debug!("🔑️ Wrong password for '{}'", account.login);
            Err(AuthApiError::InvalidCredentials)
        }
    }
}
