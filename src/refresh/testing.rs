use crate::domain::{DecCoin, Validator, ValidatorCommissionAmount};
use crate::refresh::report::{RefreshEvent, RefreshReporter};
use crate::rpc::{CommissionQueryClient, RpcError};
use crate::store::{CommissionStore, MemoryStore};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{Notify, Semaphore};

pub(crate) fn validator(name: &str) -> Validator {
    Validator::new(format!("cosmosvaloper1{name}"), format!("cosmos1{name}"))
}

#[derive(Clone)]
enum Scripted {
    Commission(Vec<DecCoin>),
    Error(RpcError),
}

/// Query client answering from a fixed per-validator script. Unscripted
/// validators get an empty commission.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: HashMap<String, Scripted>,
    calls: Mutex<Vec<(String, u64)>>,
    gate: Option<Semaphore>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_commission(mut self, operator_address: &str, coins: Vec<DecCoin>) -> Self {
        self.responses
            .insert(operator_address.to_owned(), Scripted::Commission(coins));
        self
    }

    pub(crate) fn with_error(mut self, operator_address: &str, error: RpcError) -> Self {
        self.responses
            .insert(operator_address.to_owned(), Scripted::Error(error));
        self
    }

    /// Holds every query until [`ScriptedClient::release`] hands out permits.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommissionQueryClient for ScriptedClient {
    fn validator_commission<'a>(
        &'a self,
        operator_address: &'a str,
        height: u64,
    ) -> BoxFuture<'a, Result<Vec<DecCoin>>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((operator_address.to_owned(), height));

            if let Some(gate) = &self.gate {
                gate.acquire().await?.forget();
            }

            match self.responses.get(operator_address) {
                Some(Scripted::Commission(coins)) => Ok(coins.clone()),
                Some(Scripted::Error(err)) => Err(err.clone().into()),
                None => Ok(Vec::new()),
            }
        })
    }
}

/// [`MemoryStore`] wrapper with switchable failures.
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    fail_probe: AtomicBool,
    fail_validators: AtomicBool,
    failing_writes: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_probe: AtomicBool::new(false),
            fail_validators: AtomicBool::new(false),
            failing_writes: Mutex::default(),
        }
    }

    pub(crate) fn fail_probe(&self) {
        self.fail_probe.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_validators(&self) {
        self.fail_validators.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes_for(&self, operator_address: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(operator_address.to_owned());
    }
}

impl CommissionStore for FlakyStore {
    fn get_validators(&self) -> BoxFuture<'_, Result<Vec<Validator>>> {
        if self.fail_validators.load(Ordering::SeqCst) {
            return Box::pin(async { Err(anyhow!("validator table unavailable")) });
        }
        self.inner.get_validators()
    }

    fn has_validator_commission(&self) -> BoxFuture<'_, Result<bool>> {
        if self.fail_probe.load(Ordering::SeqCst) {
            return Box::pin(async { Err(anyhow!("commission table unavailable")) });
        }
        self.inner.has_validator_commission()
    }

    fn save_validator_commission_amount(
        &self,
        amount: ValidatorCommissionAmount,
    ) -> BoxFuture<'_, Result<()>> {
        let failing = self
            .failing_writes
            .lock()
            .unwrap()
            .contains(amount.operator_address());
        if failing {
            let operator = amount.operator_address().to_owned();
            return Box::pin(async move { Err(anyhow!("write rejected for {operator}")) });
        }
        self.inner.save_validator_commission_amount(amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedEvent {
    pub kind: &'static str,
    pub height: u64,
    pub validator: Option<String>,
}

/// Reporter that keeps every event it receives.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<RecordedEvent>>,
    notify: Notify,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn kinds(&self) -> Vec<&'static str> {
        self.events().into_iter().map(|event| event.kind).collect()
    }

    pub(crate) fn has(&self, kind: &str, validator: Option<&str>) -> bool {
        self.events()
            .iter()
            .any(|event| event.kind == kind && event.validator.as_deref() == validator)
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.kind == kind)
            .count()
    }

    /// Resolves once at least `count` events of `kind` were reported.
    pub(crate) async fn wait_for(&self, kind: &str, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.count(kind) >= count {
                return;
            }
            notified.await;
        }
    }
}

impl RefreshReporter for RecordingReporter {
    fn report(&self, event: RefreshEvent<'_>) {
        self.events.lock().unwrap().push(RecordedEvent {
            kind: event.kind(),
            height: event.height(),
            validator: event.validator().map(str::to_owned),
        });
        self.notify.notify_waiters();
    }
}
