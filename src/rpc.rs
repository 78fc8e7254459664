//! Ledger query plumbing: the commission query contract, its CometBFT JSON-RPC
//! implementation, protobuf codec, authentication, options and metrics.

pub mod auth;
pub mod client;
pub mod codec;
pub mod metrics;
pub mod options;

pub use client::{CommissionQueryClient, LedgerRpcClient, RpcError};
pub use metrics::RpcMetricsSnapshot;
pub use options::RpcClientOptions;
