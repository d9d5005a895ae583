//! Effective poll interval decision

use crate::config::SchedulerConfig;
use tracing::debug;
use vehicle_api::{Feature, FeatureSet, HvacStatus, PluggedStatus, Vehicle};

/// Interval (minutes) to apply to `vehicle` on this tick
pub fn effective_interval_minutes(config: &SchedulerConfig, vehicle: &dyn Vehicle) -> u64 {
    interval_for(
        config,
        &vehicle.features(),
        vehicle.plugged_in(),
        vehicle.hvac_status(),
    )
}

/// Interval (minutes) for a vehicle in the given state.
///
/// Starts from the baseline. A plugged-in vehicle that reports battery
/// status uses the charging interval; running climate control forces zero.
/// Each step can only shorten the interval: a charging interval longer than
/// the baseline is ignored rather than applied as an override.
pub fn interval_for(
    config: &SchedulerConfig,
    features: &FeatureSet,
    plugged_in: PluggedStatus,
    hvac_status: HvacStatus,
) -> u64 {
    let mut interval = config.interval_minutes;

    if features.contains(&Feature::BatteryStatus) && plugged_in == PluggedStatus::Plugged {
        debug!("Charging, using charging interval");
        interval = interval.min(config.interval_charging_minutes);
    }

    if hvac_status == HvacStatus::On {
        debug!("HVAC on, updating every cycle");
        interval = 0;
    }

    interval
}

/// Whether a vehicle last refreshed at `last_refresh` is overdue at `now`.
///
/// Strictly greater: a zero interval is due at any time after the last refresh.
pub fn is_due(now: f64, last_refresh: f64, interval_minutes: u64) -> bool {
    now > last_refresh + interval_minutes.saturating_mul(60) as f64
}
