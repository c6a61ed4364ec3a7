//! Registry lifecycle: lazy registration, probe schedule, shutdown.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chainlcd_core::{
    HealthStatus, Registry, RegistryConfig, RequestOptions, LCD_PROBE_PATH, RPC_PROBE_PATH,
};

use support::{endpoints, Reply, ScriptedTransport, A, B, C};

fn registry(transport: &Arc<ScriptedTransport>) -> Registry {
    Registry::new(transport.clone(), RegistryConfig::default())
}

/// Let spawned probe tasks run without moving the clock meaningfully.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn probe_count(t: &ScriptedTransport) -> usize {
    t.calls()
        .iter()
        .filter(|u| u.ends_with(LCD_PROBE_PATH) || u.ends_with(RPC_PROBE_PATH))
        .count()
}

#[tokio::test(start_paused = true)]
async fn first_registration_wins() {
    let t = ScriptedTransport::new();
    let r = registry(&t);

    let first = r.get("cosmoshub", endpoints(&[A]), endpoints(&[B]));
    let again = r.get("cosmoshub", endpoints(&[C]), Vec::new());

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(again.api.len(), 1);
    assert_eq!(again.rpc.len(), 1);
    assert_eq!(again.api.stats().endpoints[0].address, A);
    assert_eq!(again.api.name(), "cosmoshub/api");
    assert_eq!(again.rpc.name(), "cosmoshub/rpc");
    assert_eq!(r.keys(), ["cosmoshub"]);

    r.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn initial_probe_runs_in_background() {
    let t = ScriptedTransport::new();
    t.script(B, Reply::Status(503));
    let r = registry(&t);

    let entry = r.get("osmosis", endpoints(&[A]), endpoints(&[B]));
    assert!(t.calls().is_empty(), "get does not wait for probes");

    settle().await;
    assert_eq!(t.hosts_for(LCD_PROBE_PATH), [A]);
    assert_eq!(t.hosts_for(RPC_PROBE_PATH), [B]);

    let api_health = entry.api.health();
    assert_eq!(api_health[A].status(), HealthStatus::Healthy);
    let rpc_health = entry.rpc.health();
    assert_eq!(rpc_health[B].status(), HealthStatus::Unhealthy);

    let stats = r.stats("osmosis").unwrap();
    let view = stats.rpc.endpoints[0].health.as_ref().unwrap();
    assert_eq!(view.status, HealthStatus::Unhealthy);
    assert_eq!(view.error.as_deref(), Some("HTTP 503"));
    assert!(stats.rpc.endpoints[0].healthy, "probe results do not touch failure state");

    r.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn probes_repeat_every_interval() {
    let t = ScriptedTransport::new();
    let r = registry(&t);
    r.get("juno", endpoints(&[A, B]), endpoints(&[C]));

    settle().await;
    assert_eq!(probe_count(&t), 3);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(probe_count(&t), 6);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(probe_count(&t), 9);

    r.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_probe_schedule() {
    let t = ScriptedTransport::new();
    let r = registry(&t);
    r.get("akash", endpoints(&[A]), endpoints(&[B]));
    settle().await;
    assert_eq!(probe_count(&t), 2);

    r.shutdown().await;
    assert!(r.is_shut_down());

    tokio::time::sleep(Duration::from_secs(900)).await;
    assert_eq!(probe_count(&t), 2);

    // lookups still work, but new services get no schedule
    r.get("stargaze", endpoints(&[C]), Vec::new());
    settle().await;
    assert_eq!(probe_count(&t), 2);
}

#[tokio::test(start_paused = true)]
async fn registration_without_schedule_checks_on_demand() {
    let t = ScriptedTransport::new();
    let r = Registry::new(
        t.clone(),
        RegistryConfig {
            probe_on_register: false,
            ..RegistryConfig::default()
        },
    );
    let entry = r.get("cosmoshub", endpoints(&[A, B]), endpoints(&[C]));

    settle().await;
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(probe_count(&t), 0);

    futures::future::join(entry.api.probe_all(), entry.rpc.probe_all()).await;
    settle().await;
    assert_eq!(probe_count(&t), 3, "one request per endpoint");
    assert_eq!(entry.api.health().len(), 2);

    r.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn hanging_probe_does_not_block_requests() {
    let t = ScriptedTransport::new();
    t.script(A, Reply::Hang);
    let r = registry(&t);
    let entry = r.get("cosmoshub", endpoints(&[A, B]), Vec::new());
    settle().await;

    // A's probe is still pending; dispatch is unaffected by it
    t.script(A, Reply::Json(r#"{"ok":true}"#));
    let v = entry
        .api
        .request("/cosmos/bank/v1beta1/balances/cosmos1abc", &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(v["ok"], true);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(entry.api.health()[A].latency_ms(), -1);

    r.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn fetch_helpers_register_one_side() {
    let t = ScriptedTransport::new();
    let r = registry(&t);

    r.fetch_api("evmos", endpoints(&[A]), "/cosmos/staking/v1beta1/pool", &RequestOptions::default())
        .await
        .unwrap();
    let entry = r.lookup("evmos").unwrap();
    assert_eq!(entry.api.len(), 1);
    assert!(entry.rpc.is_empty());

    // RPC list arrives too late: first registration already won
    let err = r
        .fetch_rpc("evmos", endpoints(&[B]), "/status", &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, chainlcd_core::DispatchError::NoEndpointConfigured));

    assert!(r.stats("unknown").is_none());
    r.shutdown().await;
}
