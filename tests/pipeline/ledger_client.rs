use std::time::Duration;

use crate::support::{
    helpers::{init_tracing, operator},
    mock_ledger::{MockLedger, MockLedgerServer},
};
use anyhow::Result;
use commission_sync::{
    CommissionQueryClient, DecCoin, LedgerRpcClient, RefreshConfig, RpcClientOptions, RpcError,
};

#[tokio::test]
async fn queries_commission_pinned_to_height() -> Result<()> {
    init_tracing();
    let ledger = MockLedger::new(1, 1_000);
    ledger.set_commission(
        500,
        &operator("alpha"),
        &[
            ("uatom", "1234500000000000000000"),
            ("ibc/27394FB0", "5"),
        ],
    );
    ledger.set_commission(600, &operator("alpha"), &[("uatom", "9000000000000000000")]);
    let server = MockLedgerServer::start(ledger.clone()).await?;

    let client = LedgerRpcClient::new(server.url())?;
    let coins = client.validator_commission(&operator("alpha"), 500).await?;

    assert_eq!(
        coins,
        vec![
            DecCoin::new("uatom", "1234.500000000000000000"),
            DecCoin::new("ibc/27394FB0", "0.000000000000000005"),
        ]
    );

    let requests = ledger.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operator_address, operator("alpha"));
    assert_eq!(requests[0].height, 500);
    assert!(!requests[0].prove);
    assert_eq!(client.metrics().total_requests, 1);
    assert_eq!(client.metrics().total_errors, 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn validator_without_commission_yields_no_coins() -> Result<()> {
    let ledger = MockLedger::new(1, 1_000);
    let server = MockLedgerServer::start(ledger).await?;

    let client = LedgerRpcClient::new(server.url())?;
    let coins = client.validator_commission(&operator("beta"), 10).await?;
    assert!(coins.is_empty());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn pruned_and_future_heights_are_unavailable() -> Result<()> {
    let ledger = MockLedger::new(100, 200);
    let server = MockLedgerServer::start(ledger).await?;
    let client = LedgerRpcClient::new(server.url())?;

    for height in [50, 250] {
        let err = client
            .validator_commission(&operator("alpha"), height)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<RpcError>(),
                Some(RpcError::HeightUnavailable { height: h }) if *h == height
            ),
            "unexpected error for height {height}: {err:#}"
        );
    }
    assert_eq!(client.metrics().total_errors, 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn query_failures_surface_code_and_log() -> Result<()> {
    let ledger = MockLedger::new(1, 1_000);
    ledger.fail_operator(&operator("ghost"), 22, "validator does not exist");
    let server = MockLedgerServer::start(ledger).await?;
    let client = LedgerRpcClient::new(server.url())?;

    let err = client
        .validator_commission(&operator("ghost"), 10)
        .await
        .unwrap_err();
    match err.downcast_ref::<RpcError>() {
        Some(RpcError::QueryFailed { code, log, .. }) => {
            assert_eq!(*code, 22);
            assert!(log.contains("does not exist"));
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn slow_node_maps_to_timeout() -> Result<()> {
    let ledger = MockLedger::new(1, 1_000);
    ledger.set_delay(Duration::from_millis(500));
    let server = MockLedgerServer::start(ledger).await?;

    let options = RpcClientOptions {
        request_timeout: Duration::from_millis(50),
        ..RpcClientOptions::default()
    };
    let client = LedgerRpcClient::with_options(server.url(), options)?;
    let err = client
        .validator_commission(&operator("alpha"), 10)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RpcError>(),
        Some(RpcError::Timeout { .. })
    ));
    assert_eq!(client.metrics().total_timeouts, 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn configured_credentials_are_sent() -> Result<()> {
    let ledger = MockLedger::new(1, 1_000);
    let server = MockLedgerServer::start(ledger.clone()).await?;

    let config = RefreshConfig::builder()
        .rpc_url(server.url())
        .rpc_credentials("indexer", "secret")
        .build()?;
    let client = LedgerRpcClient::from_config(&config)?;
    client.validator_commission(&operator("alpha"), 10).await?;

    let direct = LedgerRpcClient::with_credentials(
        server.url(),
        "indexer",
        "secret",
        RpcClientOptions::default(),
    )?;
    direct.validator_commission(&operator("alpha"), 11).await?;

    let anonymous = LedgerRpcClient::new(server.url())?;
    anonymous.validator_commission(&operator("alpha"), 12).await?;

    let requests = ledger.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests[..2] {
        assert_eq!(
            request.authorization.as_deref(),
            Some("Basic aW5kZXhlcjpzZWNyZXQ=")
        );
    }
    assert_eq!(requests[2].authorization, None);

    server.shutdown().await;
    Ok(())
}
