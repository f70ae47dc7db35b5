//! Versioned schema bootstrap and layout checks for the parcel table.
//!
//! # Responsibility
//! - Create the `parcel` table on a fresh database.
//! - Refuse databases written by a newer schema.
//! - Verify that a caller-supplied connection carries the expected layout.
//!
//! # Invariants
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - Bootstrap runs in one transaction; a failure leaves the file untouched.

use crate::db::DbResult;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Schema version understood by this build.
pub const SCHEMA_VERSION: u32 = 1;

pub const PARCEL_TABLE: &str = "parcel";
const PARCEL_COLUMNS: &[&str] = &["number", "client", "status", "address", "created_at"];

/// Ways an on-disk layout can differ from the one this build expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Written by a newer build; never downgraded.
    NewerVersion { found: u32, supported: u32 },
    /// Version stamp differs, usually a connection that skipped bootstrap.
    VersionMismatch { expected: u32, actual: u32 },
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewerVersion { found, supported } => {
                write!(f, "version {found} is newer than supported {supported}")
            }
            Self::VersionMismatch { expected, actual } => {
                write!(f, "version {actual} does not match expected {expected}")
            }
            Self::MissingTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for SchemaError {}

/// Creates the schema when missing and stamps the version.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current = user_version(conn)?;

    if current > SCHEMA_VERSION {
        return Err(SchemaError::NewerVersion {
            found: current,
            supported: SCHEMA_VERSION,
        }
        .into());
    }

    if current == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    info!(
        "event=schema_apply module=db status=ok from_version={} to_version={}",
        current, SCHEMA_VERSION
    );
    Ok(())
}

/// Checks that `conn` is stamped with the current version and has every
/// parcel column. Does not modify the database.
pub fn ensure_ready(conn: &Connection) -> DbResult<()> {
    let actual = user_version(conn)?;
    if actual != SCHEMA_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            actual,
        }
        .into());
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([PARCEL_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(SchemaError::MissingTable(PARCEL_TABLE).into());
    }

    if let Some(&column) = PARCEL_COLUMNS
        .iter()
        .find(|&&column| !columns.iter().any(|name| name == column))
    {
        return Err(SchemaError::MissingColumn {
            table: PARCEL_TABLE,
            column,
        }
        .into());
    }

    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
