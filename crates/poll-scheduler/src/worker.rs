//! Blocking call dispatch

use crate::error::SchedulerError;
use vehicle_api::{CommunicationError, VehicleId};

/// Run a blocking backend call for `vehicle` on the blocking thread pool
pub(crate) async fn call_blocking<T, F>(vehicle: &VehicleId, call: F) -> Result<T, SchedulerError>
where
    F: FnOnce() -> Result<T, CommunicationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|source| SchedulerError::Worker {
            vehicle: vehicle.clone(),
            source,
        })?
        .map_err(|source| SchedulerError::Communication {
            vehicle: vehicle.clone(),
            source,
        })
}
