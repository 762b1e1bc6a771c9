use thiserror::Error;

use crate::db_types::{AccountId, AccrualResult, AccrualUpdate, Order, OrderNumber, OrderNumberError, SubmitOutcome};

#[derive(Debug, Clone, Error)]
pub enum OrderRegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order number. {0}")]
    InvalidFormat(#[from] OrderNumberError),
    #[error("Order {0} does not exist")]
    NotFound(String),
    #[error("Invalid accrual. {0}")]
    InvalidAccrual(String),
}

impl From<sqlx::Error> for OrderRegistryError {
    fn from(e: sqlx::Error) -> Self {
        OrderRegistryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the storage behaviour behind the order registry.
///
/// An order number is claimed by exactly one account for the lifetime of the system. After creation, only the
/// accrual status and amount of an order ever change, and only in the forward direction of the status lattice.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Claims `number` for `owner`, creating a `NEW` order if the number is unclaimed. Claims are atomic, so two
    /// accounts racing for the same number cannot both succeed.
    async fn submit_order(&self, number: &OrderNumber, owner: AccountId) -> Result<SubmitOutcome, OrderRegistryError>;

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError>;

    /// All of the owner's orders, oldest first.
    async fn fetch_orders_for_account(&self, owner: AccountId) -> Result<Vec<Order>, OrderRegistryError>;

    /// A snapshot of the numbers of all orders in `NEW` or `PROCESSING` status, oldest first.
    async fn fetch_pending_order_numbers(&self) -> Result<Vec<OrderNumber>, OrderRegistryError>;

    /// Moves the order to `result.status` if that is a forward transition, and records the accrual. Stale or repeated
    /// statuses leave the order untouched and return [`AccrualUpdate::Unchanged`]. Unknown numbers fail with
    /// [`OrderRegistryError::NotFound`].
    ///
    /// Callers must pass a zero accrual for any status other than `PROCESSED`.
    async fn apply_accrual_result(
        &self,
        number: &OrderNumber,
        result: AccrualResult,
    ) -> Result<AccrualUpdate, OrderRegistryError>;
}
