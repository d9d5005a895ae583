//! Vehicle Poller Daemon
//!
//! Wires the refresh scheduler and the statistics driver to a vehicle
//! registry, runs both on their own periodic tasks, and stops them on Ctrl-C.
//! On unix, `SIGUSR1` forces an immediate refresh of every vehicle.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use poll_scheduler::{PeriodicTask, RefreshScheduler, StatisticsDriver, StatisticsResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vehicle_api::{MockVehicle, StaticRegistry};

mod settings;

pub use settings::{DaemonSettings, VehicleEntry, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};

/// Initialize logging; `RUST_LOG` takes precedence over `default_level`
pub fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Build a registry of simulated vehicles, in settings order
pub fn build_registry(vehicles: &[VehicleEntry]) -> StaticRegistry {
    let registry = StaticRegistry::new();
    for entry in vehicles {
        let vehicle = MockVehicle::new()
            .with_features(entry.features.iter().copied())
            .with_plugged(entry.plugged_in)
            .with_hvac(entry.hvac)
            .with_latency(Duration::from_millis(entry.latency_ms));
        registry.insert(entry.vin.as_str().into(), Arc::new(vehicle));
    }
    registry
}

/// Run until Ctrl-C
pub async fn run(settings: DaemonSettings) -> Result<()> {
    if let Some(addr) = settings.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install metrics exporter")?;
        info!("Serving metrics on {}", addr);
    }

    let registry = Arc::new(build_registry(&settings.vehicles));
    if registry.is_empty() {
        warn!("No vehicles configured, drivers will idle");
    }

    let scheduler = Arc::new(RefreshScheduler::new(
        settings.scheduler.clone(),
        registry.clone(),
    ));
    let statistics = Arc::new(StatisticsDriver::new(&settings.scheduler, registry));

    let refresh_task = {
        let scheduler = Arc::clone(&scheduler);
        PeriodicTask::spawn(
            scheduler.name().to_string(),
            settings.scheduler.tick_period(),
            move || {
                let scheduler = Arc::clone(&scheduler);
                async move {
                    scheduler.on_tick().await;
                }
            },
        )
    };

    let statistics_task = {
        let statistics = Arc::clone(&statistics);
        PeriodicTask::spawn(
            statistics.name().to_string(),
            statistics.period(),
            move || {
                let statistics = Arc::clone(&statistics);
                async move {
                    statistics.on_tick().await;
                }
            },
        )
    };

    let reporter = spawn_statistics_reporter(&statistics);

    wait_for_shutdown(&scheduler).await?;

    refresh_task.stop().await;
    statistics_task.stop().await;
    reporter.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Log every statistics result the driver publishes
fn spawn_statistics_reporter(statistics: &StatisticsDriver) -> JoinHandle<()> {
    let mut updates = statistics.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let result: StatisticsResult = updates.borrow_and_update().clone();
            for (vehicle, stats) in &result {
                info!(
                    %vehicle,
                    daily_trips = stats.daily.total_trips(),
                    monthly_km = stats.monthly.total_distance_km(),
                    "Trip statistics updated"
                );
            }
            match serde_json::to_string(&result) {
                Ok(json) => debug!("Statistics: {}", json),
                Err(e) => warn!("Failed to serialize statistics: {}", e),
            }
        }
    })
}

/// Run a forced update on its own task so signal handling is not blocked
/// behind a slow backend
#[cfg(unix)]
fn spawn_forced_update(
    scheduler: Arc<RefreshScheduler>,
) -> JoinHandle<poll_scheduler::TickReport> {
    tokio::spawn(async move {
        let report = scheduler.force_update().await;
        info!("Forced update refreshed {} vehicles", report.refreshed.len());
        report
    })
}

#[cfg(unix)]
async fn wait_for_shutdown(scheduler: &Arc<RefreshScheduler>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut force = signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl-C")?;
                info!("Shutdown requested");
                return Ok(());
            }
            _ = force.recv() => {
                info!("SIGUSR1 received, forcing update");
                spawn_forced_update(Arc::clone(scheduler));
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_scheduler: &Arc<RefreshScheduler>) -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poll_scheduler::SchedulerConfig;
    use vehicle_api::{Feature, HvacStatus, PluggedStatus, VehicleRegistry};

    fn entry(vin: &str) -> VehicleEntry {
        VehicleEntry {
            vin: vin.to_string(),
            features: vec![Feature::BatteryStatus, Feature::DrivingJourneyHistory],
            plugged_in: PluggedStatus::Plugged,
            hvac: HvacStatus::Off,
            latency_ms: 0,
        }
    }

    #[test]
    fn test_build_registry_keeps_order_and_state() {
        let registry = build_registry(&[entry("B"), entry("A")]);
        let vehicles = registry.vehicles();

        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].0.as_str(), "B");
        assert_eq!(vehicles[1].0.as_str(), "A");
        assert_eq!(vehicles[0].1.plugged_in(), PluggedStatus::Plugged);
        assert!(vehicles[0].1.supports(Feature::DrivingJourneyHistory));
    }

    #[tokio::test]
    async fn test_drivers_run_against_built_registry() {
        let settings = DaemonSettings {
            scheduler: SchedulerConfig::default(),
            vehicles: vec![entry("A"), entry("B")],
            ..Default::default()
        };
        let registry = Arc::new(build_registry(&settings.vehicles));
        let scheduler = RefreshScheduler::new(settings.scheduler.clone(), registry.clone());
        let statistics = StatisticsDriver::new(&settings.scheduler, registry);

        let report = scheduler.on_tick().await;
        assert_eq!(report.refreshed.len(), 2);

        let result = statistics.on_tick().await;
        assert_eq!(result.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forced_update_runs_in_background() {
        let registry = StaticRegistry::new();
        registry.insert(
            "SLOW".into(),
            Arc::new(MockVehicle::new().with_latency(Duration::from_millis(50))),
        );
        let scheduler = Arc::new(RefreshScheduler::new(
            SchedulerConfig::default(),
            Arc::new(registry),
        ));

        let handle = spawn_forced_update(Arc::clone(&scheduler));
        assert!(!handle.is_finished());

        let report = handle.await.unwrap();
        assert_eq!(report.refreshed.len(), 1);
        assert!(report.fault.is_none());
    }
}
