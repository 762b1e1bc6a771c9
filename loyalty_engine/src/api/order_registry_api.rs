//! Order identity, ownership and accrual status.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;

use crate::{
    db_types::{AccountId, AccrualResult, AccrualUpdate, Order, OrderNumber, OrderStatus, SubmitOutcome},
    traits::{OrderManagement, OrderRegistryError},
};

/// `OrderRegistryApi` is the only way orders enter the system, and the only way their accrual status changes.
pub struct OrderRegistryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderRegistryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderRegistryApi ({:?})", self.db)
    }
}

impl<B> OrderRegistryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Accepts `raw` only if it is a non-empty string of decimal digits that passes the Luhn checksum.
    pub fn validate_number(raw: &str) -> Result<OrderNumber, OrderRegistryError> {
        let number = OrderNumber::validate(raw)?;
        Ok(number)
    }
}

impl<B> OrderRegistryApi<B>
where B: OrderManagement
{
    /// Claims the order number for `owner`.
    ///
    /// Re-submitting one's own number is not an error and returns [`SubmitOutcome::AlreadyOwnedBySelf`]. A number that
    /// belongs to someone else returns [`SubmitOutcome::OwnedByOther`], and nothing is changed.
    pub async fn submit(&self, number: &OrderNumber, owner: AccountId) -> Result<SubmitOutcome, OrderRegistryError> {
        let outcome = self.db.submit_order(number, owner).await?;
        match &outcome {
            SubmitOutcome::Accepted(_) => info!("📝️ Order [{number}] accepted for {owner}"),
            SubmitOutcome::AlreadyOwnedBySelf(_) => debug!("📝️ Order [{number}] was already submitted by {owner}"),
            SubmitOutcome::OwnedByOther => info!("📝️ Order [{number}] submitted by {owner} belongs to another account"),
        }
        Ok(outcome)
    }

    /// The owner's orders, oldest first. An account with no orders gets an empty list.
    pub async fn list_orders(&self, owner: AccountId) -> Result<Vec<Order>, OrderRegistryError> {
        self.db.fetch_orders_for_account(owner).await
    }

    /// A snapshot of the numbers still waiting on the accrual authority (`NEW` or `PROCESSING`).
    pub async fn list_pending(&self) -> Result<Vec<OrderNumber>, OrderRegistryError> {
        self.db.fetch_pending_order_numbers().await
    }

    /// Folds an accrual result into the order.
    ///
    /// Status only moves forward through `NEW < PROCESSING < {INVALID, PROCESSED}`. A stale or repeated status is
    /// ignored and reported as [`AccrualUpdate::Unchanged`]. The accrual is only recorded for `PROCESSED`; for any
    /// other status the order keeps its previous (zero) accrual.
    pub async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        status: OrderStatus,
        accrual: Points,
    ) -> Result<AccrualUpdate, OrderRegistryError> {
        if accrual.is_negative() {
            return Err(OrderRegistryError::InvalidAccrual(format!("{accrual} for order {number} is negative")));
        }
        let accrual = if status == OrderStatus::Processed {
            accrual
        } else {
            if accrual != Points::zero() {
                debug!("📝️ Discarding accrual of {accrual} reported for order [{number}] with status {status}");
            }
            Points::zero()
        };
        let update = self.db.apply_accrual_result(number, AccrualResult::new(status, accrual)).await?;
        if let AccrualUpdate::Applied(order) = &update {
            info!("📝️ Order [{number}] moved to {} (accrual {})", order.status, order.accrual);
        }
        Ok(update)
    }
}
