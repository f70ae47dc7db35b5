//! Core persistence and use-cases for the parcel tracker.
//! The `parcel` table is only ever touched through this crate.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::parcel::{
    Parcel, ParcelNumber, ParcelStatus, ParcelValidationError, ParseStatusError,
};
pub use repo::parcel_repo::{
    GuardedWrite, ParcelStore, RepoError, RepoResult, SqliteParcelStore,
};
pub use service::parcel_service::{ParcelService, ServiceError, ServiceResult};

/// Minimal health-check API for linkage probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
