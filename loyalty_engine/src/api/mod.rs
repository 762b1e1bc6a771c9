//! # Loyalty engine public API
//!
//! The `api` module exposes the programmatic API for the loyalty engine. The API is modular, so that clients can pick
//! the pieces they need, and each piece only asks its backend for the traits it actually uses.
//!
//! * [`order_registry_api`] validates order numbers, arbitrates ownership and tracks accrual status.
//! * [`ledger_api`] reports balances and performs overdraft-safe withdrawals.
//! * [`auth_api`] registers accounts and checks credentials.
//! * [`reconciliation_api`] pulls results from the accrual authority into the registry.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty.db", 25).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db);
//! let balance = api.balance(account_id).await?;
//! ```
pub mod auth_api;
pub mod errors;
pub mod ledger_api;
pub mod order_registry_api;
pub mod reconciliation_api;
