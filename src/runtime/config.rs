use crate::refresh::FetchFailurePolicy;
use crate::rpc::options::{DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::runtime::telemetry;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Refresh every 100 blocks unless configured otherwise.
pub const DEFAULT_DISTRIBUTION_FREQUENCY: u64 = 100;

const ENV_RPC_URL: &str = "COMMISSION_SYNC_RPC_URL";
const ENV_RPC_USER: &str = "COMMISSION_SYNC_RPC_USER";
const ENV_RPC_PASSWORD: &str = "COMMISSION_SYNC_RPC_PASSWORD";
const ENV_RPC_TIMEOUT_SECS: &str = "COMMISSION_SYNC_RPC_TIMEOUT_SECS";
const ENV_RPC_MAX_CONCURRENT: &str = "COMMISSION_SYNC_RPC_MAX_CONCURRENT";
const ENV_DISTRIBUTION_FREQUENCY: &str = "COMMISSION_SYNC_DISTRIBUTION_FREQUENCY";
const ENV_PERSIST_ON_FETCH_FAILURE: &str = "COMMISSION_SYNC_PERSIST_ON_FETCH_FAILURE";
const ENV_METRICS_INTERVAL_SECS: &str = "COMMISSION_SYNC_METRICS_INTERVAL_SECS";

/// Runtime configuration for the commission refresh job.
///
/// Instances are built via [`RefreshConfig::builder`], [`RefreshConfig::new`], or
/// [`RefreshConfig::from_env`]; all three validate before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    distribution_frequency: u64,
    fetch_failure_policy: FetchFailurePolicy,
    rpc_url: String,
    rpc_user: Option<String>,
    rpc_password: Option<String>,
    rpc_timeout: Duration,
    rpc_max_concurrent_requests: usize,
    metrics_interval: Duration,
}

pub struct RefreshConfigParams {
    pub distribution_frequency: u64,
    pub fetch_failure_policy: FetchFailurePolicy,
    pub rpc_url: String,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub rpc_timeout: Duration,
    pub rpc_max_concurrent_requests: usize,
    pub metrics_interval: Duration,
}

impl RefreshConfig {
    pub fn builder() -> RefreshConfigBuilder {
        RefreshConfigBuilder::default()
    }

    pub fn new(params: RefreshConfigParams) -> Result<Self> {
        let RefreshConfigParams {
            distribution_frequency,
            fetch_failure_policy,
            rpc_url,
            rpc_user,
            rpc_password,
            rpc_timeout,
            rpc_max_concurrent_requests,
            metrics_interval,
        } = params;

        let config = Self {
            distribution_frequency,
            fetch_failure_policy,
            rpc_url: rpc_url.trim().to_owned(),
            rpc_user: non_empty(rpc_user),
            rpc_password: non_empty(rpc_password),
            rpc_timeout,
            rpc_max_concurrent_requests,
            metrics_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from `COMMISSION_SYNC_*` environment variables.
    ///
    /// Only `COMMISSION_SYNC_RPC_URL` is required; every other variable falls
    /// back to the builder default when unset.
    pub fn from_env() -> Result<Self> {
        let rpc_url = env::var(ENV_RPC_URL).with_context(|| format!("{ENV_RPC_URL} is required"))?;
        let persist_on_failure = parse_env_with_default::<bool>(ENV_PERSIST_ON_FETCH_FAILURE, true)?;

        let mut builder = Self::builder()
            .rpc_url(rpc_url)
            .distribution_frequency(parse_env_with_default(
                ENV_DISTRIBUTION_FREQUENCY,
                DEFAULT_DISTRIBUTION_FREQUENCY,
            )?)
            .rpc_timeout(Duration::from_secs(parse_env_with_default(
                ENV_RPC_TIMEOUT_SECS,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?))
            .rpc_max_concurrent_requests(parse_env_with_default(
                ENV_RPC_MAX_CONCURRENT,
                DEFAULT_MAX_CONCURRENT_REQUESTS,
            )?)
            .metrics_interval(Duration::from_secs(parse_env_with_default(
                ENV_METRICS_INTERVAL_SECS,
                telemetry::DEFAULT_METRICS_INTERVAL.as_secs(),
            )?));

        if !persist_on_failure {
            builder = builder.fetch_failure_policy(FetchFailurePolicy::SkipPersist);
        }

        if let Some(user) = optional_env(ENV_RPC_USER)? {
            builder = builder.rpc_user(user);
        }
        if let Some(password) = optional_env(ENV_RPC_PASSWORD)? {
            builder = builder.rpc_password(password);
        }

        builder.build()
    }

    /// Refresh interval in blocks. Zero disables the refresh entirely.
    pub fn distribution_frequency(&self) -> u64 {
        self.distribution_frequency
    }

    /// What a refresh task writes when its commission query fails.
    pub fn fetch_failure_policy(&self) -> FetchFailurePolicy {
        self.fetch_failure_policy
    }

    /// Full JSON-RPC URL (including scheme) of the ledger node.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Basic-auth credentials, when the node sits behind an authenticating proxy.
    pub fn rpc_credentials(&self) -> Option<(&str, &str)> {
        match (&self.rpc_user, &self.rpc_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Per-query timeout applied to the JSON-RPC client.
    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    pub fn rpc_max_concurrent_requests(&self) -> usize {
        self.rpc_max_concurrent_requests
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.rpc_url)?;

        if self.rpc_user.is_some() != self.rpc_password.is_some() {
            bail!("rpc_user and rpc_password must be provided together");
        }

        if self.rpc_timeout.is_zero() {
            bail!("rpc_timeout must be greater than 0");
        }

        if self.rpc_max_concurrent_requests == 0 {
            bail!("rpc_max_concurrent_requests must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RefreshConfigBuilder {
    distribution_frequency: Option<u64>,
    fetch_failure_policy: Option<FetchFailurePolicy>,
    rpc_url: Option<String>,
    rpc_user: Option<String>,
    rpc_password: Option<String>,
    rpc_timeout: Option<Duration>,
    rpc_max_concurrent_requests: Option<usize>,
    metrics_interval: Option<Duration>,
}

impl RefreshConfigBuilder {
    pub fn distribution_frequency(mut self, blocks: u64) -> Self {
        self.distribution_frequency = Some(blocks);
        self
    }

    pub fn fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.fetch_failure_policy = Some(policy);
        self
    }

    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn rpc_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.rpc_user = Some(user.into());
        self.rpc_password = Some(password.into());
        self
    }

    pub fn rpc_user(mut self, user: impl Into<String>) -> Self {
        self.rpc_user = Some(user.into());
        self
    }

    pub fn rpc_password(mut self, password: impl Into<String>) -> Self {
        self.rpc_password = Some(password.into());
        self
    }

    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }

    pub fn rpc_max_concurrent_requests(mut self, max: usize) -> Self {
        self.rpc_max_concurrent_requests = Some(max);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<RefreshConfig> {
        let params = RefreshConfigParams {
            distribution_frequency: self
                .distribution_frequency
                .unwrap_or(DEFAULT_DISTRIBUTION_FREQUENCY),
            fetch_failure_policy: self.fetch_failure_policy.unwrap_or_default(),
            rpc_url: self.rpc_url.context("rpc_url is required")?,
            rpc_user: self.rpc_user,
            rpc_password: self.rpc_password,
            rpc_timeout: self
                .rpc_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            rpc_max_concurrent_requests: self
                .rpc_max_concurrent_requests
                .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
        };

        RefreshConfig::new(params)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("rpc_url must start with http:// or https://");
    }
    Ok(())
}

fn optional_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
    }
}

fn parse_env_with_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}='{value}'")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
    }
}
