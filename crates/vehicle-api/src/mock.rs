//! In-Memory Vehicle for Testing
//!
//! Simulates a vehicle without a backend. Counts remote calls and can be
//! told to fail them.

use crate::error::CommunicationError;
use crate::model::{
    Feature, FeatureSet, HvacStatus, Period, PluggedStatus, TripHistoryData, TripSummary,
};
use crate::registry::Vehicle;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Simulated vehicle with call counters and fault injection
pub struct MockVehicle {
    features: FeatureSet,
    plugged_in: Mutex<PluggedStatus>,
    hvac_status: Mutex<HvacStatus>,
    failure: Mutex<Option<CommunicationError>>,
    latency: Duration,
    refresh_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl MockVehicle {
    /// Create a vehicle with no features, unknown plug state and HVAC off
    pub fn new() -> Self {
        Self {
            features: FeatureSet::new(),
            plugged_in: Mutex::new(PluggedStatus::Unknown),
            hvac_status: Mutex::new(HvacStatus::Off),
            failure: Mutex::new(None),
            latency: Duration::ZERO,
            refresh_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    /// Create an electric vehicle advertising battery status and trip history
    pub fn electric() -> Self {
        Self::new().with_features([Feature::BatteryStatus, Feature::DrivingJourneyHistory])
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    pub fn with_plugged(self, status: PluggedStatus) -> Self {
        self.set_plugged(status);
        self
    }

    pub fn with_hvac(self, status: HvacStatus) -> Self {
        self.set_hvac(status);
        self
    }

    /// Simulate a slow backend by sleeping inside every remote call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every remote call fail with `error`
    pub fn failing_with(self, error: CommunicationError) -> Self {
        self.set_failure(Some(error));
        self
    }

    pub fn set_plugged(&self, status: PluggedStatus) {
        *self.plugged_in.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn set_hvac(&self, status: HvacStatus) {
        *self.hvac_status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    /// Set or clear the injected failure
    pub fn set_failure(&self, error: Option<CommunicationError>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Number of `refresh` calls received, including failed ones
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_trip_histories` calls received, including failed ones
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn simulate_call(&self) -> Result<(), CommunicationError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        match self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Generate a deterministic report ending at `today`
    fn generate_history(period: Period, today: NaiveDate) -> TripHistoryData {
        let buckets: Vec<NaiveDate> = match period {
            Period::Daily => (0..7)
                .rev()
                .map(|back| today - ChronoDuration::days(back))
                .collect(),
            Period::Monthly => (0..3)
                .rev()
                .filter_map(|back| {
                    let months = today.year() * 12 + today.month0() as i32 - back;
                    NaiveDate::from_ymd_opt(months / 12, (months % 12) as u32 + 1, 1)
                })
                .collect(),
        };

        let summaries = buckets
            .into_iter()
            .map(|start| {
                // Vary the numbers by day of year so buckets are distinguishable
                let seed = start.ordinal();
                let trips = 1 + seed % 4;
                let distance_km = f64::from(trips) * (8.0 + f64::from(seed % 13));
                TripSummary {
                    start,
                    trips,
                    distance_km,
                    consumed_kwh: distance_km * 0.17,
                    recovered_kwh: distance_km * 0.03,
                }
            })
            .collect();

        TripHistoryData { period, summaries }
    }
}

impl Default for MockVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl Vehicle for MockVehicle {
    fn features(&self) -> FeatureSet {
        self.features.clone()
    }

    fn plugged_in(&self) -> PluggedStatus {
        *self.plugged_in.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn hvac_status(&self) -> HvacStatus {
        *self.hvac_status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refresh(&self) -> Result<(), CommunicationError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        debug!("Mock vehicle refresh");
        self.simulate_call()
    }

    fn fetch_trip_histories(&self, period: Period) -> Result<TripHistoryData, CommunicationError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        debug!("Mock vehicle trip history fetch ({:?})", period);
        self.simulate_call()?;
        Ok(Self::generate_history(period, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_defaults() {
        let vehicle = MockVehicle::new();
        assert!(vehicle.features().is_empty());
        assert_eq!(vehicle.plugged_in(), PluggedStatus::Unknown);
        assert_eq!(vehicle.hvac_status(), HvacStatus::Off);
        assert!(!vehicle.supports(Feature::BatteryStatus));
    }

    #[test]
    fn test_refresh_counts_calls() {
        let vehicle = MockVehicle::electric();
        vehicle.refresh().unwrap();
        vehicle.refresh().unwrap();
        assert_eq!(vehicle.refresh_calls(), 2);
        assert!(vehicle.supports(Feature::DrivingJourneyHistory));
    }

    #[test]
    fn test_injected_failure() {
        let vehicle = MockVehicle::new().failing_with(CommunicationError::Throttled);
        assert_eq!(vehicle.refresh(), Err(CommunicationError::Throttled));
        assert!(vehicle.fetch_trip_histories(Period::Daily).is_err());
        assert_eq!(vehicle.refresh_calls(), 1);
        assert_eq!(vehicle.history_calls(), 1);

        vehicle.set_failure(None);
        assert!(vehicle.refresh().is_ok());
    }

    #[test]
    fn test_generated_history_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();

        let daily = MockVehicle::generate_history(Period::Daily, today);
        assert_eq!(daily.summaries.len(), 7);
        assert_eq!(daily.summaries.last().unwrap().start, today);

        let monthly = MockVehicle::generate_history(Period::Monthly, today);
        let starts: Vec<_> = monthly.summaries.iter().map(|s| s.start).collect();
        assert_eq!(
            starts,
            vec![
                NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ]
        );
        assert!(monthly.total_trips() > 0);
    }
}
