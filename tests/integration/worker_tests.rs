//! End-to-end worker behavior against in-memory fakes

use crate::support::{registry, url, FakeNetwork, ObservedStorage};
use std::sync::Arc;
use storefront_sw::host::LocalHost;
use storefront_sw::http::{Destination, Method, Request, Response};
use storefront_sw::router::PassReason;
use storefront_sw::storage::CacheStorage;
use storefront_sw::strategy::{Source, Strategy};
use storefront_sw::worker::{Handler, ServiceWorker, WorkerState};

const SEEDS: &[&str] = &["/", "/offline/", "/static/css/style.css"];

fn shop_network() -> FakeNetwork {
    let network = FakeNetwork::new();
    network.serve("/", "<h1>Shop</h1>");
    network.serve("/offline/", "<h1>You are offline</h1>");
    network.serve("/static/css/style.css", "body{}");
    network
}

fn worker(
    version: &str,
    storage: Arc<ObservedStorage>,
    network: FakeNetwork,
    host: Arc<LocalHost>,
) -> ServiceWorker {
    ServiceWorker::new(
        registry(version, SEEDS),
        storage,
        Arc::new(network),
        host,
    )
}

async fn started(version: &str, storage: Arc<ObservedStorage>, network: FakeNetwork) -> ServiceWorker {
    let sw = worker(version, storage, network, Arc::new(LocalHost::new()));
    sw.start().await.unwrap();
    sw
}

#[tokio::test]
async fn navigation_resolves_with_nothing_available() {
    let network = FakeNetwork::new();
    network.set_down(true);
    let storage = Arc::new(ObservedStorage::new());
    let sw = worker("v4", storage.clone(), network, Arc::new(LocalHost::new()))
        .resume(WorkerState::Activated);

    for path in ["/", "/products/42/", "/checkout/?step=2"] {
        let outcome = sw.handle_fetch(Request::navigate(url(path))).await.unwrap();
        assert_eq!(
            outcome.handler,
            Handler::Strategy(Strategy::NetworkFirstWithFallback)
        );
        assert_eq!(outcome.source, Source::Synthesized);
        assert_eq!(outcome.response.status, 200);
    }
    assert!(storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn html_accept_header_counts_as_navigation() {
    let sw = started("v4", Arc::new(ObservedStorage::new()), shop_network()).await;

    let req = Request::get(url("/")).with_header("Accept", "text/html,application/xhtml+xml");
    let outcome = sw.handle_fetch(req).await.unwrap();

    assert_eq!(
        outcome.handler,
        Handler::Strategy(Strategy::NetworkFirstWithFallback)
    );
    assert_eq!(outcome.response.body, b"<h1>Shop</h1>");
}

#[tokio::test]
async fn non_get_never_touches_the_cache() {
    let network = shop_network();
    let storage = Arc::new(ObservedStorage::new());
    let sw = started("v4", storage.clone(), network.clone()).await;
    sw.settle().await;
    let (reads, writes) = (storage.reads(), storage.writes());

    for method in [Method::Post, Method::Put, Method::Delete] {
        network.serve("/cart/", "ok");
        let req = Request::navigate(url("/cart/"))
            .with_method(method)
            .with_body("qty=1");
        let outcome = sw.handle_fetch(req).await.unwrap();
        assert_eq!(outcome.handler, Handler::PassThrough(PassReason::NotGet));
    }
    sw.settle().await;

    assert_eq!(storage.reads(), reads);
    assert_eq!(storage.writes(), writes);
}

#[tokio::test]
async fn activate_twice_keeps_the_same_partitions() {
    let storage = Arc::new(ObservedStorage::new());
    for stale in ["static-v2", "pages-v2", "pages-v3"] {
        storage.open(stale).await.unwrap();
    }
    let sw = worker(
        "v4",
        storage.clone(),
        shop_network(),
        Arc::new(LocalHost::new()),
    );
    sw.install().await.unwrap();

    let first = sw.activate().await.unwrap();
    let after_first = storage.keys().await.unwrap();
    let second = sw.activate().await.unwrap();
    let after_second = storage.keys().await.unwrap();

    assert_eq!(first.deleted.len(), 3);
    assert!(second.deleted.is_empty());
    assert_eq!(after_first, after_second);
    assert_eq!(after_second, vec!["static-v4".to_string()]);
    assert_eq!(sw.state().await, WorkerState::Activated);
}

#[tokio::test]
async fn cached_asset_round_trips_until_next_version() {
    let network = shop_network();
    network.serve("/static/img/logo.png", "\u{89}PNG-bytes");
    let storage = Arc::new(ObservedStorage::new());
    let sw = started("v4", storage.clone(), network.clone()).await;

    let logo = || Request::get(url("/static/img/logo.png")).with_destination(Destination::Image);
    let first = sw.handle_fetch(logo()).await.unwrap();
    sw.settle().await;
    assert_eq!(first.source, Source::Network);

    network.set_down(true);
    let calls_before = network.calls().len();
    let second = sw.handle_fetch(logo()).await.unwrap();
    assert_eq!(second.source, Source::Cache);
    assert_eq!(second.response.body, first.response.body);
    assert_eq!(network.calls().len(), calls_before);

    // Next deployment clears the v4 partitions
    network.set_down(false);
    let next = started("v5", storage.clone(), network).await;
    assert!(!storage.has("static-v4").await.unwrap());
    assert!(next
        .router()
        .context()
        .storage
        .match_request(&logo())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn offline_root_serves_seeded_copy() {
    let network = shop_network();
    let sw = started("v4", Arc::new(ObservedStorage::new()), network.clone()).await;
    network.set_down(true);

    let outcome = sw.handle_fetch(Request::navigate(url("/"))).await.unwrap();

    assert_eq!(outcome.source, Source::Cache);
    assert_eq!(outcome.response.body, b"<h1>Shop</h1>");
}

#[tokio::test]
async fn offline_root_matches_any_spelling() {
    let network = shop_network();
    let sw = started("v4", Arc::new(ObservedStorage::new()), network.clone()).await;
    network.set_down(true);

    for spelling in ["http://localhost:8000", "HTTP://Localhost:8000/./#top"] {
        let outcome = sw.handle_fetch(Request::navigate(spelling)).await.unwrap();
        assert_eq!(outcome.source, Source::Cache, "{spelling}");
        assert_eq!(outcome.response.body, b"<h1>Shop</h1>");
    }
}

#[tokio::test]
async fn offline_root_falls_back_to_offline_document() {
    let storage = Arc::new(ObservedStorage::new());
    storage
        .put(
            "static-v4",
            &Request::get(url("/offline/")),
            Response::new(200, "<h1>You are offline</h1>"),
        )
        .await
        .unwrap();
    let network = FakeNetwork::new();
    network.set_down(true);
    let sw = worker("v4", storage, network, Arc::new(LocalHost::new()))
        .resume(WorkerState::Activated);

    let outcome = sw.handle_fetch(Request::navigate(url("/"))).await.unwrap();

    assert_eq!(outcome.source, Source::OfflineFallback);
    assert_eq!(outcome.response.body, b"<h1>You are offline</h1>");
}

#[tokio::test]
async fn script_update_replaces_cached_copy() {
    let network = shop_network();
    network.serve("/static/js/theme.js", "version A");
    let storage = Arc::new(ObservedStorage::new());
    let sw = started("v4", storage.clone(), network.clone()).await;
    let script = || Request::get(url("/static/js/theme.js")).with_destination(Destination::Script);

    sw.handle_fetch(script()).await.unwrap();
    sw.settle().await;
    network.serve("/static/js/theme.js", "version B");
    let outcome = sw.handle_fetch(script()).await.unwrap();
    sw.settle().await;

    assert_eq!(outcome.handler, Handler::Strategy(Strategy::ScriptNetworkFirst));
    assert_eq!(outcome.response.body, b"version B");
    let stored = storage.match_in("static-v4", &script()).await.unwrap().unwrap();
    assert_eq!(stored.body, b"version B");
}

#[tokio::test]
async fn cross_origin_image_is_not_cached() {
    let network = shop_network();
    network.serve("https://cdn.example.com/banner.png", "banner");
    let storage = Arc::new(ObservedStorage::new());
    let sw = started("v4", storage.clone(), network).await;
    let before = storage.entries("static-v4").await.unwrap();

    let req = Request::get("https://cdn.example.com/banner.png").with_destination(Destination::Image);
    let outcome = sw.handle_fetch(req).await.unwrap();
    sw.settle().await;

    assert_eq!(outcome.handler, Handler::PassThrough(PassReason::CrossOrigin));
    assert_eq!(outcome.response.body, b"banner");
    assert_eq!(storage.entries("static-v4").await.unwrap(), before);
    assert!(!storage.has("pages-v4").await.unwrap());
}

#[tokio::test]
async fn activation_evicts_only_stale_partitions() {
    let storage = Arc::new(ObservedStorage::new());
    for name in ["static-v2", "static-v4", "pages-v4"] {
        storage.open(name).await.unwrap();
    }
    let sw = worker("v4", storage.clone(), shop_network(), Arc::new(LocalHost::new()));
    sw.install().await.unwrap();

    let report = sw.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["static-v2".to_string()]);
    let mut keys = storage.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["pages-v4".to_string(), "static-v4".to_string()]);
}

#[tokio::test]
async fn failed_eviction_does_not_block_activation() {
    let storage = Arc::new(ObservedStorage::new());
    for name in ["static-v2", "pages-v3"] {
        storage.open(name).await.unwrap();
    }
    storage.refuse_delete("static-v2");
    let host = Arc::new(LocalHost::new());
    host.open_client(&url("/"), Some("v3")).await;
    let sw = worker("v4", storage.clone(), shop_network(), host.clone());
    sw.install().await.unwrap();

    let report = sw.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["pages-v3".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "static-v2");
    assert_eq!(report.clients_claimed, 1);
    assert_eq!(sw.state().await, WorkerState::Activated);
    assert_eq!(host.clients().await[0].controller.as_deref(), Some("v4"));
}

#[tokio::test]
async fn install_is_all_or_nothing() {
    let storage = Arc::new(ObservedStorage::new());
    let sw = ServiceWorker::new(
        registry("v4", &["/", "/offline/", "/static/css/missing.css"]),
        storage.clone(),
        Arc::new(shop_network()),
        Arc::new(LocalHost::new()),
    );

    let err = sw.install().await.unwrap_err();

    assert!(err.to_string().contains("missing.css"));
    assert_eq!(sw.state().await, WorkerState::Redundant);
    assert!(!storage.has("static-v4").await.unwrap());
}
