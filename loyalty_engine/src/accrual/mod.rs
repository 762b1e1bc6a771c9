//! # Accrual authority
//!
//! The accrual authority is the external service that decides how many points each order earns. It is eventually
//! consistent and untrusted: it may be slow, unavailable, or rate-limit us. Every error it produces is transient as far
//! as the engine is concerned.
//!
//! [`AccrualAuthority`] is the seam the reconciliation loop depends on, and [`AccrualClient`] is the HTTP
//! implementation of it.
mod client;
mod errors;

pub use client::{AccrualClient, DEFAULT_ACCRUAL_TIMEOUT};
pub use errors::AccrualError;
use lpg_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::{AccrualResult, OrderNumber, OrderStatus};

/// The order status as reported by the accrual authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The authority knows about the order but has not started on it. Not yet actionable.
    Registered,
    Processing,
    Invalid,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualReport {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl AccrualReport {
    /// Converts the report into a registry update. `REGISTERED` produces `None`, since there is nothing to apply yet.
    /// Accruals reported alongside any status other than `PROCESSED` are discarded.
    pub fn to_accrual_result(&self) -> Option<AccrualResult> {
        match self.status {
            AccrualStatus::Registered => None,
            AccrualStatus::Processing => Some(AccrualResult::new(OrderStatus::Processing, Points::zero())),
            AccrualStatus::Invalid => Some(AccrualResult::new(OrderStatus::Invalid, Points::zero())),
            AccrualStatus::Processed => {
                Some(AccrualResult::new(OrderStatus::Processed, self.accrual.unwrap_or_default()))
            },
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait AccrualAuthority {
    /// Asks the authority for the current state of `number`. Implementations must bound the time this can take.
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualReport, AccrualError>;
}
