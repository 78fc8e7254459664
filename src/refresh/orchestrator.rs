//! Per-height entry point of the commission refresh job.

use crate::refresh::dispatcher::{DispatchHandle, FanOutDispatcher, FetchFailurePolicy};
use crate::refresh::fetcher::CommissionFetcher;
use crate::refresh::persister::CommissionPersister;
use crate::refresh::report::{RefreshEvent, RefreshReporter, TracingReporter};
use crate::refresh::scheduler::{decide, CommissionPresence, RefreshDecision};
use crate::rpc::CommissionQueryClient;
use crate::runtime::config::RefreshConfig;
use crate::store::CommissionStore;
use std::sync::Arc;

/// How a call to [`RefreshOrchestrator::run_cycle`] ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Disabled,
    NotDue,
    ValidatorsUnavailable,
    NoValidators,
    /// Refresh tasks were spawned; the handle may be dropped to detach them.
    Dispatched(DispatchHandle),
}

impl CycleOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, CycleOutcome::Dispatched(_))
    }

    pub fn into_handle(self) -> Option<DispatchHandle> {
        match self {
            CycleOutcome::Dispatched(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct RefreshOrchestrator {
    store: Arc<dyn CommissionStore>,
    reporter: Arc<dyn RefreshReporter>,
    policy: FetchFailurePolicy,
}

impl RefreshOrchestrator {
    pub fn new(store: Arc<dyn CommissionStore>, reporter: Arc<dyn RefreshReporter>) -> Self {
        Self {
            store,
            reporter,
            policy: FetchFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds an orchestrator logging through a [`TracingReporter`] with the
    /// configured fetch-failure policy.
    pub fn from_config(
        config: &RefreshConfig,
        store: Arc<dyn CommissionStore>,
        reporter: TracingReporter,
    ) -> Self {
        Self::new(store, Arc::new(reporter)).with_policy(config.fetch_failure_policy())
    }

    pub fn policy(&self) -> FetchFailurePolicy {
        self.policy
    }

    /// Runs the refresh decision for `height` and, when due, spawns one refresh
    /// task per registered validator. Returns as soon as the tasks are spawned.
    pub async fn run_cycle(
        &self,
        height: u64,
        interval: u64,
        client: Arc<dyn CommissionQueryClient>,
    ) -> CycleOutcome {
        let presence = if interval == 0 {
            CommissionPresence::Unknown
        } else {
            self.probe_presence(height).await
        };

        let decision = decide(height, interval, presence);
        match decision {
            RefreshDecision::Disabled => {
                self.reporter.report(RefreshEvent::Disabled { height });
                return CycleOutcome::Disabled;
            }
            RefreshDecision::NotDue => {
                self.reporter.report(RefreshEvent::NotDue { height });
                return CycleOutcome::NotDue;
            }
            RefreshDecision::Bootstrap | RefreshDecision::Scheduled => {
                self.reporter.report(RefreshEvent::CycleStarted {
                    height,
                    bootstrap: decision == RefreshDecision::Bootstrap,
                });
            }
        }

        let validators = match self.store.get_validators().await {
            Ok(validators) => validators,
            Err(err) => {
                self.reporter.report(RefreshEvent::ValidatorsUnavailable {
                    height,
                    error: &err,
                });
                return CycleOutcome::ValidatorsUnavailable;
            }
        };

        if validators.is_empty() {
            self.reporter.report(RefreshEvent::NoValidators { height });
            return CycleOutcome::NoValidators;
        }

        self.reporter.report(RefreshEvent::Dispatched {
            height,
            validators: validators.len(),
        });

        let dispatcher = FanOutDispatcher::new(
            CommissionFetcher::new(client),
            CommissionPersister::new(self.store.clone()),
            self.reporter.clone(),
            self.policy,
        );
        CycleOutcome::Dispatched(dispatcher.dispatch(height, validators))
    }

    async fn probe_presence(&self, height: u64) -> CommissionPresence {
        let probe = self.store.has_validator_commission().await;
        if let Err(err) = &probe {
            self.reporter
                .report(RefreshEvent::PresenceUnknown { height, error: err });
        }
        CommissionPresence::from_probe(&probe)
    }
}
