//! SQLite storage bootstrap for the parcel tracker.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Own every check on the on-disk layout: version stamp, table, columns.
//!
//! # Invariants
//! - Callers own the returned connection and its lifetime.
//! - No parcel data is read or written before the schema check succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::SchemaError;

pub type DbResult<T> = Result<T, DbError>;

/// The tracker database is unavailable or has an unusable layout.
#[derive(Debug)]
pub enum DbError {
    /// Transport or statement failure reported by SQLite.
    Sqlite(rusqlite::Error),
    /// The database file is reachable but its layout is not ours.
    Schema(SchemaError),
}

impl DbError {
    /// Returns the layout problem, if this is one.
    pub fn schema(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Sqlite(_) => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Schema(err) => write!(f, "parcel schema: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<SchemaError> for DbError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}
