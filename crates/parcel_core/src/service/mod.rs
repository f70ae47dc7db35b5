//! Tracker use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Own the parcel lifecycle rules.

pub mod parcel_service;
