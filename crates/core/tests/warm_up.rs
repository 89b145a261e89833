//! Startup warm-up tests.

mod support;

use std::sync::Arc;
use std::time::Duration;

use opsdeck_core::{spawn_warm_up, ClientCache};
use opsdeck_domain::{ConnectError, ResourceKind};
use support::connector::FakeConnector;
use support::descriptor;
use support::store::MockDescriptorStore;

#[tokio::test]
async fn reachable_instances_are_admitted_and_failures_reported() {
    let mut descriptors: Vec<_> =
        (1..=4).map(|id| descriptor(id, Some(format!("es-{id}:9200").as_str()))).collect();
    descriptors.push(descriptor(5, Some("down-5:9200")));
    descriptors.push(descriptor(6, Some("down-6:9200")));
    descriptors.push(descriptor(7, None));

    let connector = FakeConnector::new();
    let counters = Arc::clone(&connector.counters);
    let cache = ClientCache::new(Arc::new(connector), Arc::new(MockDescriptorStore::new(descriptors)));

    let report = cache.warm_up(3).await;

    assert_eq!(report.admitted, vec![1, 2, 3, 4]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.failed.iter().map(|f| f.instance_id).collect::<Vec<_>>(), vec![5, 6, 7]);
    assert_eq!(report.failed[2].error, ConnectError::MissingAddress(7));
    assert_eq!(report.total(), 7);

    assert_eq!(cache.ids(), vec![1, 2, 3, 4]);
    assert_eq!(counters.dials(), 6);
}

#[tokio::test]
async fn already_cached_instances_are_skipped() {
    let store =
        MockDescriptorStore::new([descriptor(1, Some("es-1:9200")), descriptor(2, Some("es-2:9200"))]);
    let connector = FakeConnector::new();
    let counters = Arc::clone(&connector.counters);
    let cache = ClientCache::new(Arc::new(connector), Arc::new(store));

    let existing = cache.get_or_create(1).await.unwrap();
    let report = cache.warm_up(4).await;

    assert_eq!(report.admitted, vec![2]);
    assert_eq!(report.skipped, vec![1]);
    assert!(Arc::ptr_eq(&cache.get(1).unwrap(), &existing));
    assert_eq!(counters.dials(), 2);
}

#[tokio::test]
async fn only_the_cache_kind_is_warmed() {
    let mut kube = descriptor(9, Some("k8s:6443"));
    kube.kind = ResourceKind::Kubernetes;
    let store = MockDescriptorStore::new([descriptor(1, Some("es:9200")), kube]);
    let cache = ClientCache::new(Arc::new(FakeConnector::new()), Arc::new(store));

    let report = cache.warm_up(2).await;

    assert_eq!(report.total(), 1);
    assert_eq!(cache.ids(), vec![1]);
}

#[tokio::test]
async fn listing_failure_yields_empty_report() {
    let store = MockDescriptorStore::new([descriptor(1, Some("es:9200"))]);
    store.fail_listing(true);
    let cache = ClientCache::new(Arc::new(FakeConnector::new()), Arc::new(store));

    let report = cache.warm_up(2).await;

    assert_eq!(report.total(), 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn zero_concurrency_still_makes_progress() {
    let store = MockDescriptorStore::new([descriptor(1, Some("es:9200"))]);
    let cache = ClientCache::new(Arc::new(FakeConnector::new()), Arc::new(store));

    assert_eq!(cache.warm_up(0).await.admitted, vec![1]);
}

#[tokio::test]
async fn requests_during_warm_up_join_the_same_build() {
    let store = MockDescriptorStore::new([descriptor(42, Some("es:9200"))]);
    let connector = FakeConnector::new().with_delay(Duration::from_millis(100));
    let counters = Arc::clone(&connector.counters);
    let cache = Arc::new(ClientCache::new(Arc::new(connector), Arc::new(store)));

    let warm_up = spawn_warm_up(Arc::clone(&cache), 2);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let requested = cache.get_or_create(42).await.expect("client should build");
    let report = warm_up.await.expect("warm-up task panicked");

    assert_eq!(counters.dials(), 1);
    assert_eq!(report.admitted, vec![42]);
    assert!(Arc::ptr_eq(&cache.get(42).unwrap(), &requested));
}
