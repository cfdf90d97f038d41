//! Command line surface, driven through the built binary

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use storefront_sw::http::{Request, Response};
use storefront_sw::storage::{CacheStorage, DiskCacheStorage};
use storefront_sw::worker::{WorkerRecord, WorkerState};
use tempfile::TempDir;

fn sw() -> Command {
    cargo_bin_cmd!("storefront-sw")
}

/// Temp dir with a config whose storage lives next to it.
/// Port 9 (discard) refuses connections, so nothing reaches a real server.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    let caches = dir.path().join("caches");
    std::fs::write(
        &config,
        format!(
            r#"[worker]
origin = "http://127.0.0.1:9"
version = "v4"

[storage]
dir = "{}"

[network]
timeout_secs = 2
"#,
            caches.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    (dir, config)
}

/// Lay down the caches an activated v4 worker would leave behind
async fn seed_activated(caches: &Path) {
    let storage = DiskCacheStorage::new(caches).await.unwrap();
    storage.open("static-v2").await.unwrap();
    for (path, body) in [("/", "<h1>Shop</h1>"), ("/offline/", "<h1>Offline</h1>")] {
        storage
            .put(
                "static-v4",
                &Request::get(format!("http://127.0.0.1:9{path}")),
                Response::new(200, body).with_header("Content-Type", "text/html"),
            )
            .await
            .unwrap();
    }

    let mut record = WorkerRecord::new("v4");
    record.transition(WorkerState::Installed);
    record.transition(WorkerState::Activated);
    record.save(&caches.join("worker.json")).await.unwrap();
}

#[test]
fn help_displays() {
    sw().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline caching"));
}

#[test]
fn version_displays() {
    sw().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("storefront-sw"));
}

#[test]
fn config_path_honors_flag() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_from_env() {
    let (_dir, config) = workspace();
    sw().env("STOREFRONT_SW_CONFIG", &config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[worker]"))
        .stdout(predicate::str::contains("version = \"v4\""));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_set_then_show() {
    let (_dir, config) = workspace();
    let path = config.to_str().unwrap();
    sw().args(["--config", path, "config", "set", "worker.version", "v5"])
        .assert()
        .success();
    sw().args(["--config", path, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version = \"v5\""));
}

#[test]
fn config_set_unknown_key() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "config", "set", "vm.cpus", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn status_on_empty_storage() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parsed"))
        .stdout(predicate::str::contains("No cache partitions."));
}

#[test]
fn invalid_registry_is_rejected() {
    let (_dir, config) = workspace();
    let path = config.to_str().unwrap();
    sw().args(["--config", path, "config", "set", "cache.offline_url", "/nowhere/"])
        .assert()
        .success();
    sw().args(["--config", path, "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nowhere/"));
}

#[test]
fn activate_before_install_fails() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "activate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Worker is parsed, expected installed"));
}

#[test]
fn install_without_server_marks_worker_redundant() {
    let (_dir, config) = workspace();
    let path = config.to_str().unwrap();
    sw().args(["--config", path, "install"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Install failed"))
        .stderr(predicate::str::contains("Hint:"));
    sw().args(["--config", path, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redundant"));
}

#[test]
fn fetch_before_activation_goes_to_network() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "fetch", "/", "--navigate", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network request failed"));
}

#[test]
fn cache_show_missing_partition() {
    let (_dir, config) = workspace();
    sw().args(["--config", config.to_str().unwrap(), "cache", "show", "static-v9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cache partition not found"));
}

#[tokio::test]
async fn offline_navigation_uses_persisted_cache() {
    let (dir, config) = workspace();
    seed_activated(&dir.path().join("caches")).await;
    let path = config.to_str().unwrap();

    sw().args(["--config", path, "fetch", "/", "--navigate", "--offline", "--body"])
        .assert()
        .success()
        .stdout(predicate::str::contains("network-first-with-fallback"))
        .stdout(predicate::str::contains("cache"))
        .stdout(predicate::str::contains("<h1>Shop</h1>"));

    sw().args(["--config", path, "fetch", "/account/", "--navigate", "--offline", "--body"])
        .assert()
        .success()
        .stdout(predicate::str::contains("offline-fallback"))
        .stdout(predicate::str::contains("<h1>Offline</h1>"));
}

#[tokio::test]
async fn offline_cold_asset_is_gateway_timeout() {
    let (dir, config) = workspace();
    seed_activated(&dir.path().join("caches")).await;

    sw().args([
        "--config",
        config.to_str().unwrap(),
        "fetch",
        "/static/img/logo.png",
        "-d",
        "image",
        "--offline",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("cache-first-with-refresh"))
    .stdout(predicate::str::contains("504"));
}

#[tokio::test]
async fn cache_list_marks_stale_partitions() {
    let (dir, config) = workspace();
    seed_activated(&dir.path().join("caches")).await;

    sw().args(["--config", config.to_str().unwrap(), "cache", "list", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("static-v2"))
        .stdout(predicate::str::contains("static-v4"));

    sw().args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("activated"))
        .stdout(predicate::str::contains("stale"));
}

#[tokio::test]
async fn activate_again_evicts_stale_partitions() {
    let (dir, config) = workspace();
    seed_activated(&dir.path().join("caches")).await;
    let path = config.to_str().unwrap();

    sw().args(["--config", path, "activate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("static-v2 (evicted)"));
    sw().args(["--config", path, "cache", "list", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("static-v2").not());
}

#[tokio::test]
async fn cache_clear_with_yes() {
    let (dir, config) = workspace();
    seed_activated(&dir.path().join("caches")).await;
    let path = config.to_str().unwrap();

    sw().args(["--config", path, "cache", "clear", "--yes"])
        .assert()
        .success();
    sw().args(["--config", path, "cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache partitions found."));
}
