//! Transport limits for [`LedgerRpcClient`](crate::rpc::LedgerRpcClient).

use crate::runtime::config::RefreshConfig;
use anyhow::{bail, Result};
use std::time::Duration;

/// An `abci_query` request carries one hex-encoded operator address.
pub const DEFAULT_REQUEST_BODY_LIMIT_BYTES: usize = 64 * 1024;
pub const DEFAULT_RESPONSE_BODY_LIMIT_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 256;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcClientOptions {
    /// Upper bound on a single query; exceeding it yields `RpcError::Timeout`.
    pub request_timeout: Duration,
    /// In-flight queries allowed on one client. Fan-out beyond it queues in the client.
    pub max_concurrent_requests: usize,
    pub max_request_body_bytes: usize,
    pub max_response_body_bytes: usize,
}

impl Default for RpcClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_request_body_bytes: DEFAULT_REQUEST_BODY_LIMIT_BYTES,
            max_response_body_bytes: DEFAULT_RESPONSE_BODY_LIMIT_BYTES,
        }
    }
}

impl From<&RefreshConfig> for RpcClientOptions {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            request_timeout: config.rpc_timeout(),
            max_concurrent_requests: config.rpc_max_concurrent_requests(),
            ..Self::default()
        }
    }
}

impl RpcClientOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }
        if self.max_concurrent_requests == 0 {
            bail!("max_concurrent_requests must be greater than 0");
        }
        for (name, limit) in [
            ("max_request_body_bytes", self.max_request_body_bytes),
            ("max_response_body_bytes", self.max_response_body_bytes),
        ] {
            if limit == 0 || limit > u32::MAX as usize {
                bail!("{name} must be between 1 and {}", u32::MAX);
            }
        }
        Ok(())
    }
}
