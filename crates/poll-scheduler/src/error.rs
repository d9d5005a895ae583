//! Scheduler fault types

use thiserror::Error;
use tokio::task::JoinError;
use vehicle_api::{CommunicationError, VehicleId};

/// A fault that ended a driver pass early.
///
/// Never returned from a tick; carried in its report and logged.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The backend call for `vehicle` failed
    #[error("Error communicating with API for vehicle {vehicle}: {source}")]
    Communication {
        vehicle: VehicleId,
        #[source]
        source: CommunicationError,
    },

    /// The blocking worker running the call for `vehicle` panicked or was cancelled
    #[error("Worker for vehicle {vehicle} failed: {source}")]
    Worker {
        vehicle: VehicleId,
        #[source]
        source: JoinError,
    },
}

impl SchedulerError {
    /// The vehicle whose call failed
    pub fn vehicle(&self) -> &VehicleId {
        match self {
            SchedulerError::Communication { vehicle, .. } | SchedulerError::Worker { vehicle, .. } => {
                vehicle
            }
        }
    }

    /// Whether this is a backend fault, as opposed to a defect in the caller
    pub fn is_communication(&self) -> bool {
        matches!(self, SchedulerError::Communication { .. })
    }
}
