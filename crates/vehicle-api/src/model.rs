//! Vehicle State Definitions
//!
//! Capability tags, plug/climate status and trip history payloads reported
//! by the remote backend for a single vehicle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identity of a vehicle (typically its VIN)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Capability tags advertised by a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Battery and charge status can be read
    BatteryStatus,
    /// Daily/monthly trip history can be fetched
    DrivingJourneyHistory,
    /// Cabin climate control can be started remotely
    ClimateControl,
    /// Door lock status can be read
    LockStatus,
    /// Last known position can be read
    Location,
}

/// Set of capability tags for one vehicle
pub type FeatureSet = BTreeSet<Feature>;

/// Charging plug state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluggedStatus {
    #[default]
    Unknown,
    Plugged,
    NotPlugged,
    PlugError,
}

/// Cabin climate-control state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacStatus {
    On,
    Off,
    #[default]
    Unknown,
}

/// Bucket size of a trip history report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Monthly,
}

/// Aggregated trips for one bucket of a history report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    /// First day of the bucket
    pub start: NaiveDate,
    /// Number of trips in the bucket
    pub trips: u32,
    /// Distance driven (km)
    pub distance_km: f64,
    /// Energy consumed (kWh)
    pub consumed_kwh: f64,
    /// Energy recovered by regenerative braking (kWh)
    pub recovered_kwh: f64,
}

/// Time-bucketed trip history for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripHistoryData {
    /// Bucket size of `summaries`
    pub period: Period,
    /// Buckets, oldest first
    pub summaries: Vec<TripSummary>,
}

impl TripHistoryData {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            summaries: Vec::new(),
        }
    }

    /// Total trips across all buckets
    pub fn total_trips(&self) -> u32 {
        self.summaries.iter().map(|s| s.trips).sum()
    }

    /// Total distance across all buckets (km)
    pub fn total_distance_km(&self) -> f64 {
        self.summaries.iter().map(|s| s.distance_km).sum()
    }
}
