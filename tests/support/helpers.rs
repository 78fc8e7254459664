use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use commission_sync::{MemoryStore, RefreshEvent, RefreshReporter, Validator};
use once_cell::sync::Lazy;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

pub fn operator(name: &str) -> String {
    format!("cosmosvaloper1{name}")
}

pub fn seeded_store(names: &[&str]) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    for name in names {
        store.upsert_validator(Validator::new(operator(name), format!("cosmos1{name}")))?;
    }
    Ok(store)
}

pub async fn wait_for_commissions(store: &MemoryStore, expected: usize, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let current = store.commission_count()?;
        if current >= expected {
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!("expected {expected} commission records within {timeout:?}, found {current}");
        }
        sleep(Duration::from_millis(10)).await;
    }
}

/// Keeps `(kind, height, validator)` for every reported event.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<(&'static str, u64, Option<String>)>>,
}

impl EventLog {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("event log poisoned")
            .iter()
            .map(|(kind, _, _)| *kind)
            .collect()
    }

    pub fn contains(&self, kind: &str, validator: &str) -> bool {
        self.events
            .lock()
            .expect("event log poisoned")
            .iter()
            .any(|(k, _, v)| *k == kind && v.as_deref() == Some(validator))
    }
}

impl RefreshReporter for EventLog {
    fn report(&self, event: RefreshEvent<'_>) {
        self.events.lock().expect("event log poisoned").push((
            event.kind(),
            event.height(),
            event.validator().map(str::to_owned),
        ));
    }
}
