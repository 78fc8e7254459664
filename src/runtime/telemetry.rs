use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval between two metrics snapshots in the log.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(30);

const DEFAULT_LOG_FILTER: &str = "info";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs the fmt subscriber once per process, filtered by `RUST_LOG`
/// (`info` when unset). Repeat calls are no-ops and an already installed
/// global subscriber is left in place.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

/// Rolling counters describing refresh cycles and their per-validator units.
#[derive(Default, Debug)]
pub struct RefreshTelemetry {
    cycles_triggered: AtomicU64,
    cycles_skipped: AtomicU64,
    units_dispatched: AtomicU64,
    records_persisted: AtomicU64,
    fetch_failures: AtomicU64,
    persist_failures: AtomicU64,
}

impl RefreshTelemetry {
    pub fn record_cycle_triggered(&self) {
        self.cycles_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_units_dispatched(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.units_dispatched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RefreshTelemetrySnapshot {
        RefreshTelemetrySnapshot {
            cycles_triggered: self.cycles_triggered.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            units_dispatched: self.units_dispatched.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RefreshTelemetrySnapshot {
    pub cycles_triggered: u64,
    pub cycles_skipped: u64,
    pub units_dispatched: u64,
    pub records_persisted: u64,
    pub fetch_failures: u64,
    pub persist_failures: u64,
}

/// Spawns a background task that periodically logs refresh counters until
/// `shutdown` is cancelled.
pub fn spawn_metrics_reporter(
    telemetry: Arc<RefreshTelemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "commission_sync::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current = telemetry.snapshot();
                    tracing::info!(
                        target: "commission_sync::metrics",
                        cycles_triggered = current.cycles_triggered,
                        cycles_skipped = current.cycles_skipped,
                        units_dispatched = current.units_dispatched,
                        persisted_delta = current
                            .records_persisted
                            .saturating_sub(last_snapshot.records_persisted),
                        fetch_failures = current.fetch_failures,
                        persist_failures = current.persist_failures,
                        "commission refresh metrics snapshot"
                    );
                    last_snapshot = current;
                }
            }
        }
    })
}
