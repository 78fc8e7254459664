//! Per-validator fan-out for a refresh cycle.
//!
//! Each validator gets its own spawned task that fetches then persists. Tasks
//! share nothing mutable, are unbounded in number, and are never awaited by
//! the dispatching caller: the returned [`DispatchHandle`] can be dropped to
//! shed the work onto the runtime, or joined when the caller wants the outcome.

use crate::domain::{Validator, ValidatorCommissionAmount};
use crate::refresh::fetcher::CommissionFetcher;
use crate::refresh::persister::CommissionPersister;
use crate::refresh::report::{RefreshEvent, RefreshReporter};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What a refresh task writes when its commission query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Leave the stored snapshot untouched.
    SkipPersist,
    /// Still write for the validator: an empty snapshot at the requested
    /// height replaces the stored one, marking its commission as stale.
    #[default]
    PersistZeroValue,
}

/// Terminal state of a single validator's refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Persisted,
    PersistedZeroValue,
    /// The fetch failed and nothing was written.
    FetchFailed,
    PersistFailed,
    Panicked,
}

/// Aggregated outcome of a joined dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub height: u64,
    pub persisted: usize,
    pub persisted_zero_value: usize,
    pub fetch_failed: usize,
    pub persist_failed: usize,
    pub panicked: usize,
    outcomes: BTreeMap<String, UnitOutcome>,
}

impl DispatchReport {
    fn new(height: u64) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    fn record(&mut self, operator_address: String, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Persisted => self.persisted += 1,
            UnitOutcome::PersistedZeroValue => self.persisted_zero_value += 1,
            UnitOutcome::FetchFailed => self.fetch_failed += 1,
            UnitOutcome::PersistFailed => self.persist_failed += 1,
            UnitOutcome::Panicked => self.panicked += 1,
        }
        self.outcomes.insert(operator_address, outcome);
    }

    pub fn outcome(&self, operator_address: &str) -> Option<UnitOutcome> {
        self.outcomes.get(operator_address).copied()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Handles to the tasks spawned for one cycle. Dropping it detaches the tasks.
pub struct DispatchHandle {
    height: u64,
    units: Vec<(String, JoinHandle<UnitOutcome>)>,
    reporter: Arc<dyn RefreshReporter>,
}

impl DispatchHandle {
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.units.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Lets the tasks run to completion unobserved.
    pub fn detach(self) {}

    /// Waits for every task of the cycle and collects their outcomes.
    pub async fn join(self) -> DispatchReport {
        let mut report = DispatchReport::new(self.height);

        for (operator_address, handle) in self.units {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.reporter.report(RefreshEvent::UnitPanicked {
                        height: self.height,
                        validator: &operator_address,
                    });
                    UnitOutcome::Panicked
                }
            };
            report.record(operator_address, outcome);
        }

        report
    }
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("height", &self.height)
            .field("units", &self.units.len())
            .finish()
    }
}

#[derive(Clone)]
pub struct FanOutDispatcher {
    fetcher: CommissionFetcher,
    persister: CommissionPersister,
    reporter: Arc<dyn RefreshReporter>,
    policy: FetchFailurePolicy,
}

impl FanOutDispatcher {
    pub fn new(
        fetcher: CommissionFetcher,
        persister: CommissionPersister,
        reporter: Arc<dyn RefreshReporter>,
        policy: FetchFailurePolicy,
    ) -> Self {
        Self {
            fetcher,
            persister,
            reporter,
            policy,
        }
    }

    /// Spawns one fetch-then-persist task per validator and returns immediately.
    ///
    /// Must be called from within a Tokio runtime. An empty validator list
    /// spawns nothing.
    pub fn dispatch(&self, height: u64, validators: Vec<Validator>) -> DispatchHandle {
        let units = validators
            .into_iter()
            .map(|validator| {
                let operator_address = validator.operator_address().to_owned();
                let unit = self.clone();
                let handle = tokio::spawn(async move { unit.run_unit(height, validator).await });
                (operator_address, handle)
            })
            .collect();

        DispatchHandle {
            height,
            units,
            reporter: self.reporter.clone(),
        }
    }

    async fn run_unit(&self, height: u64, validator: Validator) -> UnitOutcome {
        let operator_address = validator.operator_address();

        let (record, zero_value) = match self.fetcher.fetch(height, &validator).await {
            Ok(record) => (record, false),
            Err(err) => {
                self.reporter.report(RefreshEvent::FetchFailed {
                    height,
                    validator: operator_address,
                    error: &err,
                });

                match self.policy {
                    FetchFailurePolicy::SkipPersist => {
                        self.reporter.report(RefreshEvent::PersistSkipped {
                            height,
                            validator: operator_address,
                        });
                        return UnitOutcome::FetchFailed;
                    }
                    FetchFailurePolicy::PersistZeroValue => {
                        (ValidatorCommissionAmount::zero_value(&validator, height), true)
                    }
                }
            }
        };

        match self.persister.persist(record).await {
            Ok(()) => {
                self.reporter.report(RefreshEvent::Persisted {
                    height,
                    validator: operator_address,
                    zero_value,
                });
                if zero_value {
                    UnitOutcome::PersistedZeroValue
                } else {
                    UnitOutcome::Persisted
                }
            }
            Err(err) => {
                self.reporter.report(RefreshEvent::PersistFailed {
                    height,
                    validator: operator_address,
                    error: &err,
                });
                UnitOutcome::PersistFailed
            }
        }
    }
}
