//! Parcel domain model.
//!
//! # Responsibility
//! - Define the parcel record and its delivery status lifecycle.
//! - Provide shape validation for caller-supplied fields.
//!
//! # Invariants
//! - `number` is owned by the store; values set by callers are ignored on insert.
//! - `created_at` is an RFC3339 UTC timestamp and never changes after creation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned parcel identifier.
pub type ParcelNumber = i64;

/// Delivery status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted from the client, not yet dispatched.
    Registered,
    /// Handed over to delivery.
    Sent,
    /// Received by the addressee. Final.
    Delivered,
}

impl ParcelStatus {
    /// Canonical storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Returns the following status, or `None` once delivered.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognized parcel status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl Display for ParseStatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown parcel status `{}`; expected registered|sent|delivered",
            self.0
        )
    }
}

impl Error for ParseStatusError {}

impl FromStr for ParcelStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registered" => Ok(Self::Registered),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Shape errors detected before a parcel is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    InvalidCreatedAt(String),
    /// Parses, but carries a non-zero UTC offset.
    NonUtcCreatedAt(String),
}

impl Display for ParcelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCreatedAt(value) => {
                write!(f, "created_at `{value}` is not an RFC3339 timestamp")
            }
            Self::NonUtcCreatedAt(value) => {
                write!(f, "created_at `{value}` is not in UTC")
            }
        }
    }
}

impl Error for ParcelValidationError {}

/// A tracked shipment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Zero until the store assigns a number.
    pub number: ParcelNumber,
    /// Opaque owner id, not checked against any client table.
    pub client: i64,
    pub status: ParcelStatus,
    pub address: String,
    /// RFC3339, UTC.
    pub created_at: String,
}

impl Parcel {
    /// Creates a freshly registered parcel stamped with the current UTC time.
    pub fn new(client: i64, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: now_rfc3339(),
        }
    }

    /// Checks field shapes that the schema cannot express.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|_| ParcelValidationError::InvalidCreatedAt(self.created_at.clone()))?;
        if created_at.offset().local_minus_utc() != 0 {
            return Err(ParcelValidationError::NonUtcCreatedAt(
                self.created_at.clone(),
            ));
        }
        Ok(())
    }
}

/// Current UTC time as RFC3339 with second precision and a `Z` suffix.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
