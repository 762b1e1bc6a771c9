use lpg_common::Points;
use thiserror::Error;

use crate::db_types::{AccountId, Balance, NewWithdrawal, OrderNumberError, Withdrawal, WithdrawalOutcome};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid withdrawal reference. {0}")]
    InvalidFormat(#[from] OrderNumberError),
    #[error("Invalid withdrawal amount: {0}. Amounts must be positive")]
    InvalidAmount(Points),
    #[error("Account {0} does not exist")]
    AccountNotFound(AccountId),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait defines the storage behaviour behind the points ledger.
///
/// Balances are never stored. They are recomputed from processed accruals and withdrawals on every call.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    async fn fetch_balance(&self, owner: AccountId) -> Result<Balance, LedgerError>;

    /// Debits the owner's balance in a single unit of work. Implementations must hold an exclusive per-owner lock
    /// while the balance is recomputed and the withdrawal is written, so that concurrent withdrawals cannot jointly
    /// overdraw the account.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalOutcome, LedgerError>;

    /// All of the owner's withdrawals, oldest first.
    async fn fetch_withdrawals_for_account(&self, owner: AccountId) -> Result<Vec<Withdrawal>, LedgerError>;
}
