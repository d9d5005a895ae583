//! Refresh Scheduler Implementation

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::interval::{effective_interval_minutes, is_due};
use crate::worker::call_blocking;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use vehicle_api::{Vehicle, VehicleId, VehicleRegistry};

/// Last refresh time per vehicle (Unix seconds)
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    last_refresh: HashMap<VehicleId, f64>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded refresh time, if the vehicle has an entry
    pub fn last_refresh(&self, vehicle: &VehicleId) -> Option<f64> {
        self.last_refresh.get(vehicle).copied()
    }

    /// Recorded refresh time, creating an overdue (epoch 0) entry for a new vehicle
    fn last_refresh_or_overdue(&mut self, vehicle: &VehicleId) -> f64 {
        *self.last_refresh.entry(vehicle.clone()).or_insert(0.0)
    }

    fn record(&mut self, vehicle: VehicleId, epoch_secs: f64) {
        self.last_refresh.insert(vehicle, epoch_secs);
    }

    /// Drop entries for vehicles that left the registry
    fn retain_known(&mut self, known: &HashSet<&VehicleId>) {
        self.last_refresh.retain(|vehicle, _| known.contains(vehicle));
    }

    /// Forget every entry, making all vehicles overdue
    pub fn clear(&mut self) {
        self.last_refresh.clear();
    }

    pub fn len(&self) -> usize {
        self.last_refresh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_refresh.is_empty()
    }
}

/// Outcome of one scheduler pass. Always returned, even after a fault.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Vehicles refreshed this pass, in visit order
    pub refreshed: Vec<VehicleId>,
    /// Vehicles evaluated and found not yet due
    pub skipped: Vec<VehicleId>,
    /// Fault that ended the pass early
    pub fault: Option<SchedulerError>,
}

impl TickReport {
    /// Whether the pass visited every vehicle
    pub fn completed(&self) -> bool {
        self.fault.is_none()
    }
}

/// Adaptive refresh scheduler for all vehicles in a registry
pub struct RefreshScheduler {
    /// Name used in logs
    name: String,
    /// Configuration
    config: SchedulerConfig,
    /// Vehicles to poll
    registry: Arc<dyn VehicleRegistry>,
    /// Wall-clock source
    clock: Arc<dyn Clock>,
    /// Last refresh times; held for a whole pass
    state: Mutex<ScheduleState>,
}

impl RefreshScheduler {
    /// Create a scheduler on the system clock
    pub fn new(config: SchedulerConfig, registry: Arc<dyn VehicleRegistry>) -> Self {
        Self::with_clock(config, registry, Arc::new(SystemClock))
    }

    /// Create a scheduler on a custom clock
    pub fn with_clock(
        config: SchedulerConfig,
        registry: Arc<dyn VehicleRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Refresh scheduler created (interval: {} min, charging: {} min)",
            config.interval_minutes, config.interval_charging_minutes
        );
        Self {
            name: "Refresh Scheduler".to_string(),
            config,
            registry,
            clock,
            state: Mutex::new(ScheduleState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run one pass over the registry, refreshing every vehicle that is due.
    ///
    /// Never fails: a fault is logged, ends the pass, and is reported in the
    /// returned [`TickReport`].
    #[instrument(skip(self), fields(driver = %self.name))]
    pub async fn on_tick(&self) -> TickReport {
        let mut state = self.state.lock().await;
        self.run_pass(&mut state).await
    }

    /// Make every vehicle overdue, then run one pass.
    ///
    /// The reset and the pass happen under one lock, so a concurrent natural
    /// tick sees either the old state or the state this pass leaves behind.
    #[instrument(skip(self), fields(driver = %self.name))]
    pub async fn force_update(&self) -> TickReport {
        let mut state = self.state.lock().await;
        info!("Forced update, clearing {} schedule entries", state.len());
        state.clear();
        self.run_pass(&mut state).await
    }

    /// Last recorded refresh time for `vehicle`.
    ///
    /// Waits for any running pass to finish, since a pass holds the schedule
    /// lock across its blocking refresh calls. A hung backend call therefore
    /// also blocks this accessor.
    pub async fn last_refresh(&self, vehicle: &VehicleId) -> Option<f64> {
        self.state.lock().await.last_refresh(vehicle)
    }

    /// Copy of the current schedule state.
    ///
    /// Like [`RefreshScheduler::last_refresh`], this waits for a running pass.
    pub async fn snapshot(&self) -> ScheduleState {
        self.state.lock().await.clone()
    }

    async fn run_pass(&self, state: &mut ScheduleState) -> TickReport {
        let vehicles = self.registry.vehicles();
        let known: HashSet<&VehicleId> = vehicles.iter().map(|(id, _)| id).collect();
        state.retain_known(&known);

        let mut report = TickReport::default();
        for (id, vehicle) in &vehicles {
            match self.process_vehicle(state, id, vehicle).await {
                Ok(true) => report.refreshed.push(id.clone()),
                Ok(false) => report.skipped.push(id.clone()),
                Err(e) => {
                    metrics::counter!("vehicle_refresh_faults_total").increment(1);
                    if e.is_communication() {
                        warn!("{}", e);
                    } else {
                        error!("{}", e);
                    }
                    report.fault = Some(e);
                    break;
                }
            }
        }

        debug!(
            "Pass finished: {} refreshed, {} not due",
            report.refreshed.len(),
            report.skipped.len()
        );
        report
    }

    /// Refresh `vehicle` if due; returns whether a refresh happened
    async fn process_vehicle(
        &self,
        state: &mut ScheduleState,
        id: &VehicleId,
        vehicle: &Arc<dyn Vehicle>,
    ) -> Result<bool, SchedulerError> {
        let last_refresh = state.last_refresh_or_overdue(id);
        let interval = effective_interval_minutes(&self.config, vehicle.as_ref());

        if !is_due(self.clock.now_epoch_secs(), last_refresh, interval) {
            return Ok(false);
        }

        debug!("Update overdue for {}, updating", id);
        let handle = Arc::clone(vehicle);
        call_blocking(id, move || handle.refresh()).await?;

        state.record(id.clone(), self.clock.now_epoch_secs());
        metrics::counter!("vehicle_refresh_total").increment(1);
        Ok(true)
    }
}
