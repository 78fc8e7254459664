pub mod domain;
pub mod refresh;
pub mod rpc;
pub mod runtime;
pub mod store;

pub use domain::{DecCoin, Validator, ValidatorCommissionAmount};
pub use refresh::{
    CommissionPresence, CycleOutcome, DispatchHandle, DispatchReport, FetchFailurePolicy,
    RefreshEvent, RefreshOrchestrator, RefreshReporter, TracingReporter, UnitOutcome,
};
pub use rpc::{CommissionQueryClient, LedgerRpcClient, RpcClientOptions, RpcError};
pub use runtime::config::{RefreshConfig, RefreshConfigBuilder, RefreshConfigParams};
pub use runtime::telemetry::{
    init_tracing, spawn_metrics_reporter, RefreshTelemetry, RefreshTelemetrySnapshot,
};
pub use store::{CommissionStore, MemoryStore, WriteOrdering};
