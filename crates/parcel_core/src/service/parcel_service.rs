//! Parcel use-case service.
//!
//! # Responsibility
//! - Provide tracker use-cases (register, advance, re-address, cancel).
//! - Enforce lifecycle rules that the store leaves to its callers.
//!
//! # Invariants
//! - Address changes and deletion are only allowed while `registered`.
//! - Status only moves forward: `registered -> sent -> delivered`, one step
//!   per call.
//! - Each rule is checked by the same store statement that performs the write.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{GuardedWrite, ParcelStore, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case failure: either a lifecycle rule or a store error.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    FinalStatus(ParcelNumber),
    /// Another writer changed the status after it was read.
    StatusChanged {
        number: ParcelNumber,
        expected: ParcelStatus,
        actual: ParcelStatus,
    },
    AddressLocked {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    DeleteForbidden {
        number: ParcelNumber,
        status: ParcelStatus,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::FinalStatus(number) => {
                write!(f, "parcel {number} is already delivered")
            }
            Self::StatusChanged {
                number,
                expected,
                actual,
            } => write!(
                f,
                "parcel {number} changed status from `{expected}` to `{actual}` concurrently"
            ),
            Self::AddressLocked { number, status } => write!(
                f,
                "address of parcel {number} cannot change in status `{status}`"
            ),
            Self::DeleteForbidden { number, status } => {
                write!(f, "parcel {number} cannot be deleted in status `{status}`")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Tracker use-cases over any parcel store.
pub struct ParcelService<S: ParcelStore> {
    store: S,
}

impl<S: ParcelStore> ParcelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: i64, address: impl Into<String>) -> ServiceResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.store.add(&parcel)?;

        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            parcel.number, parcel.client
        );
        Ok(parcel)
    }

    /// Lists every parcel owned by `client`.
    pub fn client_parcels(&self, client: i64) -> ServiceResult<Vec<Parcel>> {
        Ok(self.store.get_by_client(client)?)
    }

    /// Moves the parcel to the next status and returns it.
    ///
    /// # Errors
    /// - `FinalStatus` when the parcel is already delivered.
    /// - `StatusChanged` when another writer advanced it first.
    pub fn next_status(&self, number: ParcelNumber) -> ServiceResult<ParcelStatus> {
        let current = self.store.get(number)?.status;
        let Some(next) = current.next() else {
            warn!(
                "event=parcel_status_change module=service status=rejected number={} from={}",
                number, current
            );
            return Err(ServiceError::FinalStatus(number));
        };

        match self.store.set_status_when(number, current, next)? {
            GuardedWrite::Applied => {
                info!(
                    "event=parcel_status_change module=service status=ok number={} from={} to={}",
                    number, current, next
                );
                Ok(next)
            }
            GuardedWrite::StatusMismatch(actual) => {
                warn!(
                    "event=parcel_status_change module=service status=conflict number={} expected={} actual={}",
                    number, current, actual
                );
                Err(ServiceError::StatusChanged {
                    number,
                    expected: current,
                    actual,
                })
            }
        }
    }

    /// Changes the delivery address of a parcel that has not been sent yet.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> ServiceResult<()> {
        match self
            .store
            .set_address_when(number, address, ParcelStatus::Registered)?
        {
            GuardedWrite::Applied => {
                info!("event=parcel_address_change module=service status=ok number={number}");
                Ok(())
            }
            GuardedWrite::StatusMismatch(status) => {
                warn!(
                    "event=parcel_address_change module=service status=rejected number={} parcel_status={}",
                    number, status
                );
                Err(ServiceError::AddressLocked { number, status })
            }
        }
    }

    /// Deletes a parcel that has not been sent yet.
    pub fn delete(&self, number: ParcelNumber) -> ServiceResult<()> {
        match self.store.delete_when(number, ParcelStatus::Registered)? {
            GuardedWrite::Applied => {
                info!("event=parcel_delete module=service status=ok number={number}");
                Ok(())
            }
            GuardedWrite::StatusMismatch(status) => {
                warn!(
                    "event=parcel_delete module=service status=rejected number={} parcel_status={}",
                    number, status
                );
                Err(ServiceError::DeleteForbidden { number, status })
            }
        }
    }
}
