//! Vehicle Handle Contract
//!
//! This crate describes what the polling core needs from a connected
//! vehicle: its capability set, its plug and climate-control state, and two
//! blocking remote calls (`refresh` and `fetch_trip_histories`). How those
//! calls reach the backend is up to the implementor.

mod error;
mod mock;
mod model;
mod registry;

pub use error::CommunicationError;
pub use mock::MockVehicle;
pub use model::{
    Feature, FeatureSet, HvacStatus, Period, PluggedStatus, TripHistoryData, TripSummary,
    VehicleId,
};
pub use registry::{StaticRegistry, Vehicle, VehicleRegistry};
