//! Background health checking.
//!
//! A dedicated thread runs the check on a fixed-delay schedule and publishes
//! each result by swapping an `Arc<Health>`. Readers only load the latest
//! snapshot: they never block on, or trigger, a running check.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::{Health, HealthStatus};

/// Computes the current health of the service.
pub trait HealthCheck: Send + Sync + 'static {
    fn check(&self) -> Health;
}

impl<F> HealthCheck for F
where
    F: Fn() -> Health + Send + Sync + 'static,
{
    fn check(&self) -> Health {
        self()
    }
}

/// When the check runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HealthSchedule {
    pub initial_delay: Duration,
    /// Delay between the end of one check and the start of the next.
    pub period: Duration,
}

impl Default for HealthSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            period: Duration::from_secs(10),
        }
    }
}

/// Read-only view of the cached health.
#[derive(Debug, Clone)]
pub struct HealthIndicator {
    current: Arc<ArcSwap<Health>>,
}

impl HealthIndicator {
    /// An indicator that never changes.
    pub fn fixed(health: Health) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(health)),
        }
    }

    /// Most recently cached result.
    pub fn health(&self) -> Arc<Health> {
        self.current.load_full()
    }
}

/// Handle owning the checker thread. Dropping it stops the thread at its
/// next wake-up.
#[derive(Debug)]
pub struct ScheduledHealthCheck {
    indicator: HealthIndicator,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ScheduledHealthCheck {
    /// Start checking; reports out-of-service until the first check completes.
    pub fn spawn<C: HealthCheck>(
        name: &str,
        check: C,
        schedule: HealthSchedule,
    ) -> std::io::Result<Self> {
        let indicator = HealthIndicator::fixed(Health::out_of_service());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let current = indicator.current.clone();
        let worker = name.to_string();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || check_loop(&worker, &check, schedule, &current, &shutdown_rx))?;

        Ok(Self {
            indicator,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }

    pub fn health(&self) -> Arc<Health> {
        self.indicator.health()
    }

    pub fn indicator(&self) -> HealthIndicator {
        self.indicator.clone()
    }

    /// Stop the checker and wait for an in-flight check to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

fn check_loop<C: HealthCheck>(
    name: &str,
    check: &C,
    schedule: HealthSchedule,
    current: &ArcSwap<Health>,
    shutdown_rx: &mpsc::Receiver<()>,
) {
    let mut wait = schedule.initial_delay;

    loop {
        match shutdown_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let health = run_check(name, check);
        debug!(check = name, status = ?health.status, "health check completed");
        current.store(Arc::new(health));

        wait = schedule.period;
    }
}

fn run_check<C: HealthCheck>(name: &str, check: &C) -> Health {
    match panic::catch_unwind(AssertUnwindSafe(|| check.check())) {
        Ok(health) => health,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "health check panicked".to_string());
            warn!(check = name, %reason, "health check panicked");
            Health::new(HealthStatus::Down).with_detail("error", reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    fn wait_for(indicator: &HealthIndicator, status: HealthStatus) -> Arc<Health> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let health = indicator.health();
            if health.status == status {
                return health;
            }
            assert!(Instant::now() < deadline, "health never became {status:?}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn reports_out_of_service_before_first_run() {
        let check = ScheduledHealthCheck::spawn(
            "health-test-pending",
            Health::up,
            HealthSchedule {
                initial_delay: Duration::from_secs(3600),
                period: Duration::from_secs(3600),
            },
        )
        .unwrap();

        assert_eq!(check.health().status, HealthStatus::OutOfService);
        check.shutdown();
    }

    #[test]
    fn caches_result_of_scheduled_run() {
        let check = ScheduledHealthCheck::spawn(
            "health-test-up",
            || Health::up().with_detail("db", "ok"),
            HealthSchedule {
                initial_delay: Duration::ZERO,
                period: Duration::from_millis(10),
            },
        )
        .unwrap();

        let health = wait_for(&check.indicator(), HealthStatus::Up);
        assert_eq!(health.details["db"], "ok");
        check.shutdown();
    }

    #[test]
    fn failing_check_is_cached_as_is() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let check = ScheduledHealthCheck::spawn(
            "health-test-flapping",
            move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Health::up()
                } else {
                    Health::down().with_detail("reason", "dependency unreachable")
                }
            },
            HealthSchedule {
                initial_delay: Duration::ZERO,
                period: Duration::from_millis(5),
            },
        )
        .unwrap();

        let health = wait_for(&check.indicator(), HealthStatus::Down);
        assert_eq!(health.details["reason"], "dependency unreachable");
        check.shutdown();
    }

    #[test]
    fn panicking_check_is_reported_down() {
        let check = ScheduledHealthCheck::spawn(
            "health-test-panic",
            || -> Health { panic!("pool poisoned") },
            HealthSchedule {
                initial_delay: Duration::ZERO,
                period: Duration::from_secs(3600),
            },
        )
        .unwrap();

        let health = wait_for(&check.indicator(), HealthStatus::Down);
        assert_eq!(health.details["error"], "pool poisoned");
        check.shutdown();
    }

    #[test]
    fn readers_see_previous_value_while_check_is_in_flight() {
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);
        let calls = AtomicUsize::new(0);

        let check = ScheduledHealthCheck::spawn(
            "health-test-inflight",
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Health::up();
                }
                let _ = entered_tx.lock().unwrap().send(());
                let _ = release_rx.lock().unwrap().recv();
                Health::down()
            },
            HealthSchedule {
                initial_delay: Duration::ZERO,
                period: Duration::from_millis(5),
            },
        )
        .unwrap();

        let indicator = check.indicator();
        wait_for(&indicator, HealthStatus::Up);

        // Second run is now blocked inside the check.
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let indicator = indicator.clone();
                thread::spawn(move || indicator.health().status)
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), HealthStatus::Up);
        }

        release_tx.send(()).unwrap();
        wait_for(&indicator, HealthStatus::Down);
        drop(release_tx);
        check.shutdown();
    }
}
