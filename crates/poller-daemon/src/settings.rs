//! Daemon settings

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use poll_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use vehicle_api::{Feature, HvacStatus, PluggedStatus};

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "POLLER_CONFIG";
/// Settings file used when `POLLER_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "poller.toml";

/// A simulated vehicle to register at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEntry {
    pub vin: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub plugged_in: PluggedStatus,
    #[serde(default)]
    pub hvac: HvacStatus,
    /// Simulated backend latency per call (ms)
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub scheduler: SchedulerConfig,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Prometheus listener; metrics are not exported when unset
    pub metrics_addr: Option<SocketAddr>,
    pub vehicles: Vec<VehicleEntry>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            log_level: "info".to_string(),
            metrics_addr: None,
            vehicles: Vec::new(),
        }
    }
}

impl DaemonSettings {
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load defaults, then the settings file if present, then `POLLER__*` variables
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let builder = Config::builder()
            .add_source(File::from(path.clone()).required(false))
            .add_source(
                Environment::with_prefix("POLLER")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Self = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document, ignoring the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .context("Failed to parse settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate().context("Invalid scheduler settings")?;

        let mut seen = std::collections::HashSet::new();
        for vehicle in &self.vehicles {
            if vehicle.vin.trim().is_empty() {
                anyhow::bail!("vehicle entries must have a non-empty vin");
            }
            if !seen.insert(vehicle.vin.as_str()) {
                anyhow::bail!("vehicle {} is listed more than once", vehicle.vin);
            }
        }
        Ok(())
    }
}
