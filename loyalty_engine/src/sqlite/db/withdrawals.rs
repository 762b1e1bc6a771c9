//! Sqlite database operations for the points ledger.
//!
//! The balance is derived on every call from processed accruals and the withdrawal log. Nothing here caches a balance.
use chrono::Utc;
use log::debug;
use lpg_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::{AccountId, Balance, NewWithdrawal, OrderNumber, OrderStatus, Withdrawal};

pub async fn accrued_total(owner: AccountId, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE owner_id = $1 AND status = $2")
            .bind(owner)
            .bind(OrderStatus::Processed)
            .fetch_one(conn)
            .await?;
    Ok(Points::from(total))
}

pub async fn withdrawn_total(owner: AccountId, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE owner_id = $1")
        .bind(owner)
        .fetch_one(conn)
        .await?;
    Ok(Points::from(total))
}

pub async fn balance(owner: AccountId, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let accrued = accrued_total(owner, &mut *conn).await?;
    let withdrawn = withdrawn_total(owner, conn).await?;
    Ok(Balance::new(accrued, withdrawn))
}

pub async fn withdrawal_exists(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM withdrawals WHERE number = $1")
        .bind(number.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Inserts the withdrawal row. This performs no balance checks. Callers must hold the owner's lock.
pub async fn insert_withdrawal(
    withdrawal: &NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let inserted: Withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (number, owner_id, amount, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.number.as_str())
    .bind(withdrawal.owner_id)
    .bind(withdrawal.amount)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Withdrawal [{}] of {} recorded for {}", inserted.number, inserted.amount, inserted.owner_id);
    Ok(inserted)
}

/// Fetches the owner's withdrawals, ordered by `processed_at` in ascending order.
pub async fn fetch_withdrawals_for_account(
    owner: AccountId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE owner_id = $1 ORDER BY processed_at ASC, id ASC")
        .bind(owner)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
