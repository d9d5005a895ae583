//! Trip Statistics Collection

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::worker::call_blocking;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};
use vehicle_api::{Feature, Period, TripHistoryData, Vehicle, VehicleId, VehicleRegistry};

/// Daily and monthly trip history for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatistics {
    pub daily: TripHistoryData,
    pub monthly: TripHistoryData,
}

/// Statistics keyed by vehicle, rebuilt from scratch every tick
pub type StatisticsResult = BTreeMap<VehicleId, VehicleStatistics>;

/// Periodic trip history collector
pub struct StatisticsDriver {
    /// Name used in logs
    name: String,
    /// Collection period
    period: Duration,
    /// Vehicles to collect for
    registry: Arc<dyn VehicleRegistry>,
    /// Latest result, published to subscribers
    latest: watch::Sender<StatisticsResult>,
    /// Serialises ticks
    tick_lock: Mutex<()>,
}

impl StatisticsDriver {
    pub fn new(config: &SchedulerConfig, registry: Arc<dyn VehicleRegistry>) -> Self {
        let (latest, _) = watch::channel(StatisticsResult::new());
        info!(
            "Statistics driver created (period: {} min)",
            config.interval_statistics_minutes
        );
        Self {
            name: "Statistics Driver".to_string(),
            period: config.statistics_period(),
            registry,
            latest,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// How often the host should call [`StatisticsDriver::on_tick`]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Receiver that observes every published result
    pub fn subscribe(&self) -> watch::Receiver<StatisticsResult> {
        self.latest.subscribe()
    }

    /// The most recently published result
    pub fn latest(&self) -> StatisticsResult {
        self.latest.borrow().clone()
    }

    /// Fetch daily and monthly history for every vehicle with trip history.
    ///
    /// A fault ends the pass; whatever was collected before it is returned
    /// and published.
    #[instrument(skip(self), fields(driver = %self.name))]
    pub async fn on_tick(&self) -> StatisticsResult {
        let _guard = self.tick_lock.lock().await;

        let mut output = StatisticsResult::new();
        for (id, vehicle) in self.registry.vehicles() {
            if !vehicle.supports(Feature::DrivingJourneyHistory) {
                debug!("Vehicle {} has no trip history, skipping", id);
                continue;
            }

            match Self::collect(&id, &vehicle).await {
                Ok(statistics) => {
                    output.insert(id, statistics);
                }
                Err(e) => {
                    metrics::counter!("statistics_fetch_faults_total").increment(1);
                    if e.is_communication() {
                        warn!("Error communicating with statistics API: {}", e);
                    } else {
                        error!("{}", e);
                    }
                    break;
                }
            }
        }

        debug!("Collected statistics for {} vehicles", output.len());
        self.latest.send_replace(output.clone());
        output
    }

    async fn collect(
        id: &VehicleId,
        vehicle: &Arc<dyn Vehicle>,
    ) -> Result<VehicleStatistics, SchedulerError> {
        let daily = Self::fetch(id, vehicle, Period::Daily).await?;
        let monthly = Self::fetch(id, vehicle, Period::Monthly).await?;
        Ok(VehicleStatistics { daily, monthly })
    }

    async fn fetch(
        id: &VehicleId,
        vehicle: &Arc<dyn Vehicle>,
        period: Period,
    ) -> Result<TripHistoryData, SchedulerError> {
        let handle = Arc::clone(vehicle);
        let history = call_blocking(id, move || handle.fetch_trip_histories(period)).await?;
        metrics::counter!("statistics_fetch_total").increment(1);
        Ok(history)
    }
}
