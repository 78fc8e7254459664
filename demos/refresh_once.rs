//! Runs one commission refresh cycle against a live node.
//!
//! ```text
//! COMMISSION_SYNC_RPC_URL=http://127.0.0.1:26657 \
//!     cargo run --example refresh_once -- <height> <valoper>=<self-delegate> [...]
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use commission_sync::{
    init_tracing, spawn_metrics_reporter, CommissionStore, LedgerRpcClient, MemoryStore, RefreshConfig,
    RefreshOrchestrator, TracingReporter, Validator,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let height: u64 = args
        .next()
        .context("missing <height> argument")?
        .parse()
        .context("height must be an unsigned integer")?;

    let store = MemoryStore::new();
    for arg in args {
        let Some((operator, self_delegate)) = arg.split_once('=') else {
            bail!("validator argument '{arg}' must look like <valoper>=<self-delegate>");
        };
        store.upsert_validator(Validator::new(operator, self_delegate))?;
    }

    let config = RefreshConfig::from_env()?;
    let client = Arc::new(LedgerRpcClient::from_config(&config)?);
    let reporter = TracingReporter::new();
    let telemetry = reporter.telemetry();

    let shutdown = CancellationToken::new();
    let metrics = spawn_metrics_reporter(telemetry, shutdown.clone(), config.metrics_interval());

    let orchestrator = RefreshOrchestrator::from_config(&config, Arc::new(store.clone()), reporter);
    let outcome = orchestrator
        .run_cycle(height, config.distribution_frequency(), client.clone())
        .await;

    match outcome.into_handle() {
        Some(handle) => {
            let report = handle.join().await;
            println!(
                "height {}: {} persisted, {} zero-value, {} fetch failures, {} persist failures",
                report.height,
                report.persisted,
                report.persisted_zero_value,
                report.fetch_failed,
                report.persist_failed
            );
            for validator in store.get_validators().await? {
                if let Some(record) = store.validator_commission(validator.operator_address())? {
                    println!(
                        "{} @ {}: {:?}",
                        record.operator_address(),
                        record.height(),
                        record.amount()
                    );
                }
            }
        }
        None => println!("height {height}: no refresh due"),
    }

    let rpc = client.metrics();
    println!(
        "rpc: {} requests, {} errors, {:.1} ms mean latency",
        rpc.total_requests, rpc.total_errors, rpc.average_latency_ms
    );

    shutdown.cancel();
    metrics.await.context("metrics reporter panicked")?;
    Ok(())
}
