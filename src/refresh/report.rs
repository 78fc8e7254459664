//! Reporting capability handed to the refresh job.
//!
//! Refresh components never log directly. Every lifecycle step and failure is
//! emitted as a [`RefreshEvent`] and the [`RefreshReporter`] decides what to do
//! with it. [`TracingReporter`] is the production implementation.

use crate::runtime::telemetry::RefreshTelemetry;
use anyhow::Error;
use std::sync::Arc;

const MODULE: &str = "distribution";

#[derive(Debug)]
pub enum RefreshEvent<'a> {
    Disabled {
        height: u64,
    },
    PresenceUnknown {
        height: u64,
        error: &'a Error,
    },
    NotDue {
        height: u64,
    },
    CycleStarted {
        height: u64,
        bootstrap: bool,
    },
    ValidatorsUnavailable {
        height: u64,
        error: &'a Error,
    },
    NoValidators {
        height: u64,
    },
    Dispatched {
        height: u64,
        validators: usize,
    },
    FetchFailed {
        height: u64,
        validator: &'a str,
        error: &'a Error,
    },
    PersistSkipped {
        height: u64,
        validator: &'a str,
    },
    Persisted {
        height: u64,
        validator: &'a str,
        zero_value: bool,
    },
    PersistFailed {
        height: u64,
        validator: &'a str,
        error: &'a Error,
    },
    UnitPanicked {
        height: u64,
        validator: &'a str,
    },
}

impl RefreshEvent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            RefreshEvent::Disabled { .. } => "disabled",
            RefreshEvent::PresenceUnknown { .. } => "presence_unknown",
            RefreshEvent::NotDue { .. } => "not_due",
            RefreshEvent::CycleStarted { .. } => "cycle_started",
            RefreshEvent::ValidatorsUnavailable { .. } => "validators_unavailable",
            RefreshEvent::NoValidators { .. } => "no_validators",
            RefreshEvent::Dispatched { .. } => "dispatched",
            RefreshEvent::FetchFailed { .. } => "fetch_failed",
            RefreshEvent::PersistSkipped { .. } => "persist_skipped",
            RefreshEvent::Persisted { .. } => "persisted",
            RefreshEvent::PersistFailed { .. } => "persist_failed",
            RefreshEvent::UnitPanicked { .. } => "unit_panicked",
        }
    }

    pub fn height(&self) -> u64 {
        match self {
            RefreshEvent::Disabled { height }
            | RefreshEvent::PresenceUnknown { height, .. }
            | RefreshEvent::NotDue { height }
            | RefreshEvent::CycleStarted { height, .. }
            | RefreshEvent::ValidatorsUnavailable { height, .. }
            | RefreshEvent::NoValidators { height }
            | RefreshEvent::Dispatched { height, .. }
            | RefreshEvent::FetchFailed { height, .. }
            | RefreshEvent::PersistSkipped { height, .. }
            | RefreshEvent::Persisted { height, .. }
            | RefreshEvent::PersistFailed { height, .. }
            | RefreshEvent::UnitPanicked { height, .. } => *height,
        }
    }

    pub fn validator(&self) -> Option<&str> {
        match self {
            RefreshEvent::FetchFailed { validator, .. }
            | RefreshEvent::PersistSkipped { validator, .. }
            | RefreshEvent::Persisted { validator, .. }
            | RefreshEvent::PersistFailed { validator, .. }
            | RefreshEvent::UnitPanicked { validator, .. } => Some(*validator),
            _ => None,
        }
    }
}

/// Sink for refresh events. Shared by every concurrently running refresh task.
pub trait RefreshReporter: Send + Sync {
    fn report(&self, event: RefreshEvent<'_>);
}

/// Logs events through `tracing` (debug for lifecycle, error for failures)
/// and keeps [`RefreshTelemetry`] counters up to date.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    telemetry: Arc<RefreshTelemetry>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_telemetry(telemetry: Arc<RefreshTelemetry>) -> Self {
        Self { telemetry }
    }

    pub fn telemetry(&self) -> Arc<RefreshTelemetry> {
        self.telemetry.clone()
    }
}

impl RefreshReporter for TracingReporter {
    fn report(&self, event: RefreshEvent<'_>) {
        match event {
            RefreshEvent::Disabled { height } => {
                self.telemetry.record_cycle_skipped();
                tracing::debug!(
                    module = MODULE,
                    height,
                    "validator commission refresh interval set to 0; skipping refresh"
                );
            }
            RefreshEvent::PresenceUnknown { height, error } => {
                tracing::error!(
                    module = MODULE,
                    height,
                    error = %format_args!("{error:#}"),
                    "error while checking validator commission amount"
                );
            }
            RefreshEvent::NotDue { height } => {
                self.telemetry.record_cycle_skipped();
                tracing::trace!(module = MODULE, height, "validator commission refresh not due");
            }
            RefreshEvent::CycleStarted { height, bootstrap } => {
                self.telemetry.record_cycle_triggered();
                tracing::debug!(
                    module = MODULE,
                    height,
                    bootstrap,
                    "updating validators commissions"
                );
            }
            RefreshEvent::ValidatorsUnavailable { height, error } => {
                tracing::error!(
                    module = MODULE,
                    height,
                    error = %format_args!("{error:#}"),
                    "error while getting validators"
                );
            }
            RefreshEvent::NoValidators { height } => {
                tracing::debug!(module = MODULE, height, "no validators to refresh");
            }
            RefreshEvent::Dispatched { height, validators } => {
                self.telemetry.record_units_dispatched(validators as u64);
                tracing::debug!(
                    module = MODULE,
                    height,
                    validators,
                    "dispatched validator commission refresh tasks"
                );
            }
            RefreshEvent::FetchFailed {
                height,
                validator,
                error,
            } => {
                self.telemetry.record_fetch_failure();
                tracing::error!(
                    module = MODULE,
                    height,
                    validator,
                    error = %format_args!("{error:#}"),
                    "error while fetching validator commission"
                );
            }
            RefreshEvent::PersistSkipped { height, validator } => {
                tracing::debug!(
                    module = MODULE,
                    height,
                    validator,
                    "skipping commission write after failed fetch"
                );
            }
            RefreshEvent::Persisted {
                height,
                validator,
                zero_value,
            } => {
                self.telemetry.record_persisted();
                tracing::debug!(
                    module = MODULE,
                    height,
                    validator,
                    zero_value,
                    "saved validator commission amount"
                );
            }
            RefreshEvent::PersistFailed {
                height,
                validator,
                error,
            } => {
                self.telemetry.record_persist_failure();
                tracing::error!(
                    module = MODULE,
                    height,
                    validator,
                    error = %format_args!("{error:#}"),
                    "error while saving validator commission amounts"
                );
            }
            RefreshEvent::UnitPanicked { height, validator } => {
                tracing::error!(
                    module = MODULE,
                    height,
                    validator,
                    "validator commission refresh task panicked"
                );
            }
        }
    }
}
