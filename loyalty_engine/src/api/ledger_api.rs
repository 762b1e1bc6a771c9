//! Balances and withdrawals.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;

use crate::{
    db_types::{AccountId, Balance, NewWithdrawal, OrderNumber, Withdrawal, WithdrawalOutcome},
    traits::{LedgerError, LedgerManagement},
};

/// The `LedgerApi` reports what an account holds and lets it spend points.
pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// `current` is the sum of processed accruals less the sum of withdrawals, and `withdrawn` is the sum of
    /// withdrawals. This read takes no lock.
    pub async fn balance(&self, owner: AccountId) -> Result<Balance, LedgerError> {
        self.db.fetch_balance(owner).await
    }

    /// Withdraws `amount` against the reference `reference`.
    ///
    /// The reference must be a Luhn-valid number and the amount must be positive. Both are checked before the
    /// backend is touched. Insufficient funds and reused references are ordinary outcomes, not errors.
    pub async fn withdraw(
        &self,
        owner: AccountId,
        reference: &str,
        amount: Points,
    ) -> Result<WithdrawalOutcome, LedgerError> {
        let number = OrderNumber::validate(reference)?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let outcome = self.db.withdraw(NewWithdrawal::new(owner, number.clone(), amount)).await?;
        match &outcome {
            WithdrawalOutcome::Completed(w) => info!("💸️ {owner} withdrew {} against [{}]", w.amount, w.number),
            WithdrawalOutcome::InsufficientFunds { available } => {
                debug!("💸️ {owner} has {available} available and cannot withdraw {amount} against [{number}]")
            },
            WithdrawalOutcome::DuplicateReference => {
                debug!("💸️ {owner} tried to reuse withdrawal reference [{number}]")
            },
        }
        Ok(outcome)
    }

    /// The owner's withdrawals, oldest first.
    pub async fn list_withdrawals(&self, owner: AccountId) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_account(owner).await
    }
}
