//! Domain model for tracked parcels.
//!
//! # Responsibility
//! - Define the canonical parcel record shared by store and service layers.
//!
//! # Invariants
//! - Every stored parcel is identified by a store-assigned `ParcelNumber`.
//! - Status is a closed set; free-form status strings never reach storage.

pub mod parcel;
