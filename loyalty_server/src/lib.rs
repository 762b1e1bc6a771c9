//! # Loyalty points gateway server
//! This crate hosts the HTTP service for the loyalty points gateway. It is responsible for:
//! * Registering and authenticating users, and issuing access tokens.
//! * Accepting order numbers from users and reporting their accrual status.
//! * Reporting balances and accepting withdrawals.
//! * Running the reconciliation worker that pulls accrual results from the accrual authority.
//!
//! ## Configuration
//! The server is configured via environment variables and command-line flags. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register` and `/api/user/login`: Account creation and login.
//! * `/api/user/orders`: Submit an order number (POST) or list your orders (GET).
//! * `/api/user/balance` and `/api/user/balance/withdraw`: Your balance, and spending it.
//! * `/api/user/withdrawals`: Your withdrawal history.
pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
