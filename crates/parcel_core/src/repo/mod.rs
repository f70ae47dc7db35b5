//! Repository layer for parcel persistence.
//!
//! # Responsibility
//! - Define the parcel store contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod parcel_repo;
