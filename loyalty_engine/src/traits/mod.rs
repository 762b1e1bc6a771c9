//! # Backend contracts
//!
//! This module defines the behaviour a storage backend must expose to support the loyalty engine. The public APIs in
//! [`crate::api`] are generic over these traits, so a backend only has to implement the traits for the APIs it serves.
//!
//! * [`OrderManagement`] owns order identity, ownership claims and the accrual status lifecycle.
//! * [`LedgerManagement`] computes balances and performs overdraft-safe withdrawals.
//! * [`AccountManagement`] stores accounts and their credentials.
//!
//! Every mutating method must be atomic: either all of its effects are committed, or none are.
mod account_management;
mod ledger_management;
mod order_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderRegistryError};
