//! Small, dependency-light helpers used across the engine.
pub mod luhn;
pub mod password;

pub use password::{hash_password, verify_password, PasswordError};
