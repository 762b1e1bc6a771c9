//! Loyalty Engine
//!
//! The loyalty engine tracks the orders customers submit, the bonus points an external accrual authority awards for
//! them, and the withdrawals customers make against their points. It is storage-agnostic.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]). You should never need to talk to
//!    the database directly. Instead, use the public API. The exception is the data types used in the database. These
//!    are defined in the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@api`]): the order registry, the points ledger, authentication, and reconciliation.
//! 3. The accrual authority client ([`mod@accrual`]).
//!
//! The balance is never stored. It is recomputed from processed accruals and withdrawals every time it is needed, and
//! withdrawals hold a per-account lock while they check it, so concurrent withdrawals can never overdraw an account.
pub mod accrual;
pub mod api;
pub mod db_types;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use accrual::{AccrualAuthority, AccrualClient, AccrualError, AccrualReport, AccrualStatus};
pub use api::{
    auth_api::AuthApi,
    errors::AuthApiError,
    ledger_api::LedgerApi,
    order_registry_api::OrderRegistryApi,
    reconciliation_api::{ReconciliationApi, ReconciliationSummary},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    LedgerError,
    LedgerManagement,
    OrderManagement,
    OrderRegistryError,
};
