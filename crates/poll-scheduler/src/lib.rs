//! Vehicle Polling Scheduler
//!
//! Decides per vehicle when to spend one of the backend's rate-limited
//! refresh calls, shortening the interval while the vehicle is charging or
//! running climate control, and periodically collects trip statistics.

mod clock;
mod config;
mod driver;
mod error;
mod interval;
mod refresh;
mod statistics;
mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SchedulerConfig};
pub use driver::PeriodicTask;
pub use error::SchedulerError;
pub use interval::{effective_interval_minutes, interval_for, is_due};
pub use refresh::{RefreshScheduler, ScheduleState, TickReport};
pub use statistics::{StatisticsDriver, StatisticsResult, VehicleStatistics};
