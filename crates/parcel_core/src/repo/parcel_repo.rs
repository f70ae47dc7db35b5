//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate `Parcel` values to and from `parcel` rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every operation is a single statement touching at most one row on writes.
//! - Guarded writes (`*_when`) test the expected status in the same
//!   statement as the write.
//! - Write paths call `Parcel::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - No business rules: any status or address may be written at any time.

use crate::db::schema::ensure_ready;
use crate::db::DbError;
use crate::model::parcel::{Parcel, ParcelNumber, ParcelStatus, ParcelValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for parcel persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ParcelValidationError),
    Db(DbError),
    NotFound(ParcelNumber),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ParcelValidationError> for RepoError {
    fn from(value: ParcelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a write that only applies while the parcel is in an expected status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedWrite {
    Applied,
    /// Nothing was written; the parcel currently has this status.
    StatusMismatch(ParcelStatus),
}

/// Persistence contract for parcels.
pub trait ParcelStore {
    /// Inserts a parcel and returns the store-assigned number.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel; `NotFound` when absent.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Loads every parcel owned by `client`; empty when none.
    fn get_by_client(&self, client: i64) -> RepoResult<Vec<Parcel>>;
    /// Overwrites the address only.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Overwrites the status only.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Removes the parcel row.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Overwrites the address only while the status is `expected`.
    fn set_address_when(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<GuardedWrite>;
    /// Replaces `expected` with `status`; any other current status is left alone.
    fn set_status_when(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
        status: ParcelStatus,
    ) -> RepoResult<GuardedWrite>;
    /// Removes the parcel row only while the status is `expected`.
    fn delete_when(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
    ) -> RepoResult<GuardedWrite>;
}

/// SQLite-backed parcel store borrowing a caller-owned connection.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    /// Wraps a connection prepared by [`crate::db::open_db`].
    ///
    /// # Errors
    /// - `Db(DbError::Schema(_))` when the version stamp or layout differs.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_ready(conn)?;
        Ok(Self { conn })
    }

    fn guarded(&self, number: ParcelNumber, changed: usize) -> RepoResult<GuardedWrite> {
        if changed > 0 {
            return Ok(GuardedWrite::Applied);
        }
        // Zero rows: either the parcel is gone or its status moved on.
        let current = self.get(number)?;
        Ok(GuardedWrite::StatusMismatch(current.status))
    }
}

impl ParcelStore for SqliteParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        parcel.validate()?;

        self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        match rows.next()? {
            Some(row) => parse_parcel_row(row),
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn get_by_client(&self, client: i64) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARCEL_SELECT_SQL} WHERE client = ?1 ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2;",
            params![address, number],
        )?;
        ensure_changed(changed, number)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2;",
            params![status.as_str(), number],
        )?;
        ensure_changed(changed, number)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number])?;
        ensure_changed(changed, number)
    }

    fn set_address_when(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<GuardedWrite> {
        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2 AND status = ?3;",
            params![address, number, expected.as_str()],
        )?;
        self.guarded(number, changed)
    }

    fn set_status_when(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
        status: ParcelStatus,
    ) -> RepoResult<GuardedWrite> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2 AND status = ?3;",
            params![status.as_str(), number, expected.as_str()],
        )?;
        self.guarded(number, changed)
    }

    fn delete_when(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
    ) -> RepoResult<GuardedWrite> {
        let changed = self.conn.execute(
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
            params![number, expected.as_str()],
        )?;
        self.guarded(number, changed)
    }
}

fn ensure_changed(changed: usize, number: ParcelNumber) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(number));
    }
    Ok(())
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ParcelStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in parcel.status"))
    })?;

    let parcel = Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    };
    parcel.validate().map_err(|err| {
        RepoError::InvalidData(format!("{err} in parcel {}", parcel.number))
    })?;
    Ok(parcel)
}
