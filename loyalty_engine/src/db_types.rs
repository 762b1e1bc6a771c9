//! Data types shared between the storage backends and the public engine API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use lpg_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       AccountId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

//--------------------------------------        Account        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub password_hash: String,
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// A Luhn-valid decimal order number.
///
/// The same type is used for withdrawal references, which follow the same format rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("The order number is empty")]
    Empty,
    #[error("The order number '{0}' contains characters other than decimal digits")]
    NotNumeric(String),
    #[error("The order number '{0}' is too large")]
    OutOfRange(String),
    #[error("The order number '{0}' fails the Luhn checksum")]
    ChecksumFailed(String),
}

impl OrderNumber {
    /// Checks that `raw` is a non-empty string of decimal digits that passes the Luhn checksum. The value must fit in a
    /// signed 64-bit integer. Leading zeros are kept as given.
    pub fn validate(raw: &str) -> Result<Self, OrderNumberError> {
        if raw.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NotNumeric(raw.to_string()));
        }
        if raw.parse::<i64>().is_err() {
            return Err(OrderNumberError::OutOfRange(raw.to_string()));
        }
        if !luhn::is_valid(raw) {
            return Err(OrderNumberError::ChecksumFailed(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Wraps a value that is already known to be valid, e.g. one read back from storage.
    pub fn new_unchecked<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::validate(&s).map_err(serde::de::Error::custom)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------      OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The order has been accepted, but the accrual authority has not reported on it yet.
    New,
    /// The accrual authority is computing the bonus for the order.
    Processing,
    /// The accrual authority rejected the order. No points are awarded. Terminal.
    Invalid,
    /// The accrual has been computed and credited. Terminal.
    Processed,
}

impl OrderStatus {
    /// Position in the lattice `NEW < PROCESSING < {INVALID, PROCESSED}`.
    pub fn rank(&self) -> u8 {
        match self {
            Self::New => 0,
            Self::Processing => 1,
            Self::Invalid | Self::Processed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }

    /// Status only ever moves forward. Repeating the current status is not a transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        next.rank() > self.rank()
    }

    /// The statuses from which `self` may be reached.
    pub fn predecessors(&self) -> &'static [OrderStatus] {
        match self {
            Self::New => &[],
            Self::Processing => &[Self::New],
            Self::Invalid | Self::Processed => &[Self::New, Self::Processing],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub owner_id: AccountId,
    pub status: OrderStatus,
    /// Zero until the order is `PROCESSED`.
    pub accrual: Points,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What happened when an order number was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The number was unclaimed and now belongs to the submitter.
    Accepted(Order),
    /// The submitter already owns this number. Nothing changed.
    AlreadyOwnedBySelf(Order),
    /// Another account owns this number. Nothing changed, and retrying will not help.
    OwnedByOther,
}

/// An accrual result as it is applied to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualResult {
    pub status: OrderStatus,
    pub accrual: Points,
}

impl AccrualResult {
    pub fn new(status: OrderStatus, accrual: Points) -> Self {
        Self { status, accrual }
    }
}

/// The outcome of applying an accrual result to an existing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualUpdate {
    /// The order moved forward to the new status.
    Applied(Order),
    /// The result was stale or repeated the current status, so the order was left as it was.
    Unchanged(Order),
}

impl AccrualUpdate {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

//--------------------------------------       Withdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub number: OrderNumber,
    pub owner_id: AccountId,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub owner_id: AccountId,
    pub number: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new(owner_id: AccountId, number: OrderNumber, amount: Points) -> Self {
        Self { owner_id, number, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    Completed(Withdrawal),
    /// The balance at the moment the owner's lock was taken did not cover the amount. Nothing was written.
    InsufficientFunds { available: Points },
    /// A withdrawal with this reference already exists. Nothing was written.
    DuplicateReference,
}

//--------------------------------------        Balance        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Total processed accruals less total withdrawals.
    pub current: Points,
    pub withdrawn: Points,
}

impl Balance {
    pub fn new(accrued: Points, withdrawn: Points) -> Self {
        Self { current: accrued - withdrawn, withdrawn }
    }
}
