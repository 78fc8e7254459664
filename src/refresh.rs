//! Validator commission refresh job.
//!
//! At each processed height the [`RefreshOrchestrator`] consults the scheduler,
//! lists the registered validators and fans out one fetch-then-persist task per
//! validator through the [`FanOutDispatcher`].

pub mod dispatcher;
pub mod fetcher;
pub mod orchestrator;
pub mod persister;
pub mod report;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{
    DispatchHandle, DispatchReport, FanOutDispatcher, FetchFailurePolicy, UnitOutcome,
};
pub use fetcher::CommissionFetcher;
pub use orchestrator::{CycleOutcome, RefreshOrchestrator};
pub use persister::CommissionPersister;
pub use report::{RefreshEvent, RefreshReporter, TracingReporter};
pub use scheduler::{decide, should_refresh, CommissionPresence, RefreshDecision};
