//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{accounts, db_url, new_pool, orders, withdrawals};
use crate::{
    db_types::{
        Account,
        AccountId,
        AccrualResult,
        AccrualUpdate,
        Balance,
        NewAccount,
        NewWithdrawal,
        Order,
        OrderNumber,
        SubmitOutcome,
        Withdrawal,
        WithdrawalOutcome,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderRegistryError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `LPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl OrderManagement for SqliteDatabase {
    async fn submit_order(&self, number: &OrderNumber, owner: AccountId) -> Result<SubmitOutcome, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        orders::idempotent_insert(number, owner, &mut conn).await
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_account(&self, owner: AccountId) -> Result<Vec<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_account(owner, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_pending_order_numbers(&self) -> Result<Vec<OrderNumber>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let numbers = orders::fetch_pending_order_numbers(&mut conn).await?;
        Ok(numbers)
    }

    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: AccrualResult,
    ) -> Result<AccrualUpdate, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let update = orders::update_accrual(number, result, &mut tx).await?;
        tx.commit().await?;
        Ok(update)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_balance(&self, owner: AccountId) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = withdrawals::balance(owner, &mut conn).await?;
        Ok(balance)
    }

    /// Takes a withdrawal request, and in a single atomic transaction,
    /// * writes the owner's account row, which takes the database write lock. Any other writer, including a
    ///   concurrent withdrawal for the same owner, waits here until this transaction ends.
    /// * rejects a reference that has already been used.
    /// * recomputes the balance under the lock and rejects the withdrawal if it would overdraw the account.
    /// * inserts the withdrawal row.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalOutcome, LedgerError> {
        let owner = withdrawal.owner_id;
        let mut tx = self.pool.begin().await?;
        if !accounts::lock_account(owner, &mut tx).await? {
            tx.rollback().await?;
            return Err(LedgerError::AccountNotFound(owner));
        }
        if withdrawals::withdrawal_exists(&withdrawal.number, &mut tx).await? {
            tx.rollback().await?;
            debug!("🗃️ Withdrawal reference [{}] has already been used", withdrawal.number);
            return Ok(WithdrawalOutcome::DuplicateReference);
        }
        let balance = withdrawals::balance(owner, &mut tx).await?;
        if balance.current < withdrawal.amount {
            tx.rollback().await?;
            debug!("🗃️ {owner} cannot withdraw {}. Available: {}", withdrawal.amount, balance.current);
            return Ok(WithdrawalOutcome::InsufficientFunds { available: balance.current });
        }
        match withdrawals::insert_withdrawal(&withdrawal, &mut tx).await {
            Ok(w) => {
                tx.commit().await?;
                Ok(WithdrawalOutcome::Completed(w))
            },
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tx.rollback().await?;
                Ok(WithdrawalOutcome::DuplicateReference)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_withdrawals_for_account(&self, owner: AccountId) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_account(owner, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        accounts::create_account(account, &mut conn).await
    }

    async fn fetch_account(&self, account_id: AccountId) -> Result<Option<Account>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account(account_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<Account>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account_by_login(login, &mut conn).await?;
        Ok(account)
    }
}
