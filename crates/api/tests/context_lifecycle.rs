//! Integration tests for AppContext lifecycle
//!
//! Covers creation, startup warm-up and shutdown of the application context.

mod support;

use std::time::Duration;

use support::{closed_port_address, create_test_context, healthy_cluster, register};

#[tokio::test(flavor = "multi_thread")]
async fn test_context_creation_succeeds() {
    let result = create_test_context().await;
    assert!(result.is_ok(), "AppContext creation should succeed, got error: {:?}", result.err());

    let (context, _temp_dir) = result.unwrap();

    assert!(context.search_clients.is_empty(), "cache starts empty");
    assert!(context.db.path().exists(), "database file should be created");

    let health = context.health_check().await;
    assert!(health.is_healthy, "fresh context should be healthy: {health:?}");
    assert!(health.component("database").is_some_and(|c| c.is_healthy));

    context.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_completes_within_timeout() {
    let (context, _temp_dir) =
        create_test_context().await.expect("AppContext creation should succeed");

    let result = tokio::time::timeout(Duration::from_secs(5), context.shutdown()).await;

    assert!(result.is_ok(), "shutdown() should complete within 5 seconds");
    assert!(result.unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_is_idempotent() {
    let (context, _temp_dir) =
        create_test_context().await.expect("AppContext creation should succeed");

    for i in 1..=3 {
        let result = context.shutdown().await;
        assert!(result.is_ok(), "shutdown() call #{} should succeed, got: {:?}", i, result.err());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_warm_up_caches_reachable_instances() {
    let (context, _temp_dir) =
        create_test_context().await.expect("AppContext creation should succeed");

    let cluster = healthy_cluster("logs").await;
    let reachable = register(&context, "logs", Some(cluster.address().to_string())).await;
    let unreachable = register(&context, "gone", Some(closed_port_address())).await;
    let unconfigured = register(&context, "blank", None).await;

    assert!(context.start_warm_up());
    let report = context.wait_for_warm_up().await.expect("warm-up should report");

    assert_eq!(report.admitted, vec![reachable]);
    assert!(report.skipped.is_empty());
    let failed: Vec<_> = report.failed.iter().map(|f| f.instance_id).collect();
    assert_eq!(failed, vec![unreachable, unconfigured]);

    assert_eq!(context.search_clients.ids(), vec![reachable]);

    // Second pass finds the client already cached.
    assert!(context.start_warm_up());
    let report = context.wait_for_warm_up().await.expect("warm-up should report");
    assert_eq!(report.skipped, vec![reachable]);
    assert!(report.admitted.is_empty());

    context.shutdown().await.expect("shutdown should succeed");
    assert!(context.search_clients.is_empty(), "shutdown should evict every client");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wait_without_warm_up_returns_none() {
    let (context, _temp_dir) =
        create_test_context().await.expect("AppContext creation should succeed");

    assert!(context.wait_for_warm_up().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_during_warm_up() {
    let (context, _temp_dir) =
        create_test_context().await.expect("AppContext creation should succeed");

    let slow = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&slow)
        .await;
    register(&context, "slow", Some(slow.address().to_string())).await;

    assert!(context.start_warm_up());
    assert!(!context.start_warm_up(), "second start while running is rejected");

    let result = tokio::time::timeout(Duration::from_secs(5), context.shutdown()).await;
    assert!(result.is_ok(), "shutdown must not wait for the slow probe");
    assert!(context.wait_for_warm_up().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cleanup_via_drop_without_shutdown() {
    {
        let (_context, _temp_dir) =
            create_test_context().await.expect("AppContext creation should succeed");
    }

    let result = create_test_context().await;
    assert!(result.is_ok(), "new context after drop should succeed");
}
