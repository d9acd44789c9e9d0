//! `keel-health`: health reporting backed by a scheduled background check.

pub mod model;
pub mod scheduled;

pub use model::{Health, HealthStatus};
pub use scheduled::{HealthCheck, HealthIndicator, HealthSchedule, ScheduledHealthCheck};
