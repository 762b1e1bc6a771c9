//! Sqlite database operations for user accounts.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AccountManagement`] trait
//! methods that are implemented on the [`SqliteDatabase`] struct instead.
use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Account, AccountId, NewAccount},
    traits::AccountApiError,
};

pub async fn create_account(account: NewAccount, conn: &mut SqliteConnection) -> Result<Account, AccountApiError> {
    let now = Utc::now();
    let result = sqlx::query_as::<_, Account>(
        r#"
            INSERT INTO accounts (login, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(&account.login)
    .bind(&account.password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(created) => {
            debug!("🗃️ Account {} created for '{}'", created.id, created.login);
            Ok(created)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AccountApiError::LoginTaken(account.login)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_account(id: AccountId, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(account)
}

pub async fn fetch_account_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(account)
}

/// Writes the account row, taking the write lock that serializes ledger updates for this owner. Must be the first
/// statement of the enclosing transaction. Returns `false` if the account does not exist.
pub async fn lock_account(id: AccountId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE accounts SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
