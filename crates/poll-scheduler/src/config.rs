//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default poll interval for idle vehicles (minutes)
pub const DEFAULT_INTERVAL: u64 = 60;
/// Default poll interval while charging (minutes)
pub const DEFAULT_INTERVAL_CHARGING: u64 = 15;
/// Default statistics collection period (minutes)
pub const DEFAULT_INTERVAL_STATISTICS: u64 = 1440;
/// Default refresh scheduler tick period (seconds)
pub const DEFAULT_TICK_SECONDS: u64 = 60;
/// Longest accepted interval of any kind (one year, in minutes)
pub const MAX_INTERVAL_MINUTES: u64 = 525_600;

/// Invalid scheduler settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("interval_charging must be at least one minute")]
    ZeroChargingInterval,

    #[error("interval_statistics must be at least one minute")]
    ZeroStatisticsInterval,

    #[error("tick_seconds must be at least one second")]
    ZeroTickPeriod,

    #[error("{key} must be at most {max} minutes, got {value}")]
    IntervalTooLong {
        key: &'static str,
        value: u64,
        max: u64,
    },
}

/// Polling intervals, read once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Poll interval for vehicles that are not charging (minutes)
    #[serde(rename = "interval")]
    pub interval_minutes: u64,
    /// Poll interval for plugged-in vehicles with battery status (minutes)
    #[serde(rename = "interval_charging")]
    pub interval_charging_minutes: u64,
    /// Statistics collection period (minutes)
    #[serde(rename = "interval_statistics")]
    pub interval_statistics_minutes: u64,
    /// Refresh scheduler tick period (seconds)
    pub tick_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL,
            interval_charging_minutes: DEFAULT_INTERVAL_CHARGING,
            interval_statistics_minutes: DEFAULT_INTERVAL_STATISTICS,
            tick_seconds: DEFAULT_TICK_SECONDS,
        }
    }
}

impl SchedulerConfig {
    /// Check the settings for values the drivers cannot run with.
    ///
    /// A zero baseline interval is accepted and means "refresh every tick".
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_charging_minutes == 0 {
            return Err(ConfigError::ZeroChargingInterval);
        }
        if self.interval_statistics_minutes == 0 {
            return Err(ConfigError::ZeroStatisticsInterval);
        }
        if self.tick_seconds == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        let limits = [
            ("interval", self.interval_minutes),
            ("interval_charging", self.interval_charging_minutes),
            ("interval_statistics", self.interval_statistics_minutes),
            ("tick_seconds", self.tick_seconds / 60),
        ];
        for (key, value) in limits {
            if value > MAX_INTERVAL_MINUTES {
                return Err(ConfigError::IntervalTooLong {
                    key,
                    value,
                    max: MAX_INTERVAL_MINUTES,
                });
            }
        }
        Ok(())
    }

    /// Period of the refresh scheduler's tick driver
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    /// Period of the statistics driver
    pub fn statistics_period(&self) -> Duration {
        Duration::from_secs(self.interval_statistics_minutes.saturating_mul(60))
    }
}
