//! Ledger query client answering height-pinned commission lookups against a
//! CometBFT node's JSON-RPC endpoint. Houses the `LedgerRpcClient`, its error
//! type, and the `CommissionQueryClient` trait consumed by refresh tasks.

use crate::domain::DecCoin;
use crate::rpc::auth::basic_auth_headers;
use crate::rpc::codec::{
    decode_commission_response, encode_commission_request, VALIDATOR_COMMISSION_PATH,
};
use crate::rpc::metrics::{QueryOutcome, RpcMetrics, RpcMetricsSnapshot};
use crate::rpc::options::RpcClientOptions;
use crate::runtime::config::RefreshConfig;
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use jsonrpsee::core::client::{ClientT, Error as JsonRpcError};
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HeaderMap, HttpClient, HttpClientBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::{timeout, Instant};

const ABCI_QUERY_METHOD: &str = "abci_query";

/// Log fragments CometBFT and the SDK emit when the requested height cannot be served.
const HEIGHT_UNAVAILABLE_MARKERS: &[&str] = &[
    "version does not exist",
    "height in the future",
    "is not available",
    "failed to load state at height",
];

#[derive(Debug, Clone)]
pub enum RpcError {
    Timeout { method: &'static str },
    HeightUnavailable { height: u64 },
    QueryFailed { code: u32, codespace: String, log: String },
    MalformedResponse { reason: String },
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::Timeout { method } => write!(f, "rpc method {method} timed out"),
            RpcError::HeightUnavailable { height } => {
                write!(f, "ledger state at height {height} is not available")
            }
            RpcError::QueryFailed {
                code,
                codespace,
                log,
            } => write!(
                f,
                "abci query failed (code={code}, codespace={codespace}): {log}"
            ),
            RpcError::MalformedResponse { reason } => {
                write!(f, "malformed abci query response: {reason}")
            }
        }
    }
}

impl std::error::Error for RpcError {}

/// Remote query handle used by refresh tasks. Implementations must resolve the
/// query against the ledger state as of `height`, not the current head.
pub trait CommissionQueryClient: Send + Sync {
    fn validator_commission<'a>(
        &'a self,
        operator_address: &'a str,
        height: u64,
    ) -> BoxFuture<'a, Result<Vec<DecCoin>>>;
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciQueryResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AbciQueryResponse {
    code: u32,
    log: String,
    codespace: String,
    value: Option<String>,
    height: String,
}

#[derive(Debug, Clone)]
pub struct LedgerRpcClient {
    rpc_url: Arc<String>,
    client: HttpClient,
    options: RpcClientOptions,
    metrics: Arc<RpcMetrics>,
}

impl CommissionQueryClient for LedgerRpcClient {
    fn validator_commission<'a>(
        &'a self,
        operator_address: &'a str,
        height: u64,
    ) -> BoxFuture<'a, Result<Vec<DecCoin>>> {
        Box::pin(self.query_validator_commission(operator_address, height))
    }
}

impl LedgerRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_options(url, RpcClientOptions::default())
    }

    pub fn with_options(url: impl Into<String>, options: RpcClientOptions) -> Result<Self> {
        Self::build(url.into(), HeaderMap::new(), options)
    }

    pub fn with_credentials(
        url: impl Into<String>,
        user: &str,
        password: &str,
        options: RpcClientOptions,
    ) -> Result<Self> {
        let headers = basic_auth_headers(Some((user, password)))?;
        Self::build(url.into(), headers, options)
    }

    pub fn from_config(config: &RefreshConfig) -> Result<Self> {
        config.validate()?;
        let options = RpcClientOptions::from(config);

        let headers = basic_auth_headers(config.rpc_credentials())?;
        Self::build(config.rpc_url().to_owned(), headers, options)
    }

    fn build(rpc_url: String, headers: HeaderMap, options: RpcClientOptions) -> Result<Self> {
        options.validate()?;

        let max_request_body_size = u32::try_from(options.max_request_body_bytes)
            .context("max_request_body_bytes does not fit in u32")?;
        let max_response_body_size = u32::try_from(options.max_response_body_bytes)
            .context("max_response_body_bytes does not fit in u32")?;

        let client = HttpClientBuilder::default()
            .set_headers(headers)
            .request_timeout(options.request_timeout)
            .max_concurrent_requests(options.max_concurrent_requests)
            .max_request_size(max_request_body_size)
            .max_response_size(max_response_body_size)
            .build(&rpc_url)
            .map_err(|err| anyhow!("failed to build RPC client: {err}"))?;

        Ok(Self {
            rpc_url: Arc::new(rpc_url),
            client,
            options,
            metrics: Arc::new(RpcMetrics::default()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    pub fn metrics(&self) -> RpcMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Queries the commission accrued by `operator_address` as of `height`.
    ///
    /// Issues exactly one request; callers decide what to do with failures.
    pub async fn query_validator_commission(
        &self,
        operator_address: &str,
        height: u64,
    ) -> Result<Vec<DecCoin>> {
        let start = Instant::now();
        // Height 0 would make the node answer from its latest state.
        let result = if height == 0 {
            Err(RpcError::HeightUnavailable { height }.into())
        } else {
            self.abci_query(
                VALIDATOR_COMMISSION_PATH,
                encode_commission_request(operator_address),
                height,
            )
            .await
            .and_then(|response| commission_from_response(response, height))
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(coins) => {
                self.metrics.record(QueryOutcome::Success, elapsed);
                tracing::trace!(
                    validator = operator_address,
                    height,
                    denoms = coins.len(),
                    "validator commission query completed"
                );
            }
            Err(err) => self.metrics.record(classify(err), elapsed),
        }

        result
    }

    async fn abci_query(
        &self,
        path: &str,
        data_hex: String,
        height: u64,
    ) -> Result<AbciQueryResponse> {
        let mut params = ObjectParams::new();
        params
            .insert("path", path)
            .context("failed to serialize abci_query path")?;
        params
            .insert("data", data_hex)
            .context("failed to serialize abci_query data")?;
        params
            .insert("height", height.to_string())
            .context("failed to serialize abci_query height")?;
        params
            .insert("prove", false)
            .context("failed to serialize abci_query prove flag")?;

        let result: AbciQueryResult = timeout(
            self.options.request_timeout,
            self.client.request(ABCI_QUERY_METHOD, params),
        )
        .await
        .map_err(|_| RpcError::Timeout {
            method: ABCI_QUERY_METHOD,
        })?
        .map_err(|err| map_rpc_error(ABCI_QUERY_METHOD, err))?;

        Ok(result.response)
    }
}

fn commission_from_response(response: AbciQueryResponse, height: u64) -> Result<Vec<DecCoin>> {
    if response.code != 0 {
        if height_unavailable(&response.log) {
            return Err(RpcError::HeightUnavailable { height }.into());
        }
        return Err(RpcError::QueryFailed {
            code: response.code,
            codespace: response.codespace,
            log: response.log,
        }
        .into());
    }

    if !response.height.is_empty() && response.height != "0" && response.height != height.to_string()
    {
        tracing::warn!(
            requested_height = height,
            served_height = response.height.as_str(),
            "node answered commission query at a different height"
        );
    }

    let value = response.value.unwrap_or_default();
    decode_commission_response(&value).map_err(|err| {
        anyhow::Error::from(RpcError::MalformedResponse {
            reason: format!("{err:#}"),
        })
    })
}

fn classify(err: &anyhow::Error) -> QueryOutcome {
    match err.downcast_ref::<RpcError>() {
        Some(RpcError::Timeout { .. }) => QueryOutcome::Timeout,
        Some(RpcError::HeightUnavailable { .. }) => QueryOutcome::HeightUnavailable,
        _ => QueryOutcome::Failed,
    }
}

fn height_unavailable(log: &str) -> bool {
    let log = log.to_ascii_lowercase();
    HEIGHT_UNAVAILABLE_MARKERS
        .iter()
        .any(|marker| log.contains(marker))
}

fn map_rpc_error(label: &'static str, err: JsonRpcError) -> anyhow::Error {
    match err {
        JsonRpcError::Call(call) => {
            if let Some(data) = call.data() {
                anyhow!(
                    "rpc {label} call failed (code={}, message={}, data={})",
                    call.code(),
                    call.message(),
                    data.get()
                )
            } else {
                anyhow!(
                    "rpc {label} call failed (code={}, message={})",
                    call.code(),
                    call.message()
                )
            }
        }
        JsonRpcError::RequestTimeout => RpcError::Timeout { method: label }.into(),
        other => anyhow!("rpc {label} call failed: {other}"),
    }
}
