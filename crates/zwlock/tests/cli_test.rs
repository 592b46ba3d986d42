//! Integration tests for the `zwlock` CLI binary.
//!
//! Argument parsing, config inspection and accessory listing run without a
//! gateway; the lock commands run against a wiremock gateway.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `zwlock` binary with env isolation.
///
/// Clears all `ZWLOCK_*` env vars and points home and config directories
/// at `home` so tests never touch the user's real configuration.
fn zwlock_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("zwlock");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("ZWLOCK_CONFIG")
        .env_remove("ZWLOCK_OUTPUT")
        .env_remove("ZWLOCK_HOST")
        .env_remove("ZWLOCK_USER")
        .env_remove("ZWLOCK_PASS")
        .env_remove("ZWLOCK_STORAGE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = zwlock_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Z-Way")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("lock"))
            .and(predicate::str::contains("accessories")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("zwlock"));
}

#[test]
fn test_lock_requires_node_id() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path())
        .arg("lock")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<NODE>"));
}

#[test]
fn test_beeper_rejects_unknown_state() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path())
        .args(["beeper", "5", "loud"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("custom.toml");
    zwlock_cmd(home.path())
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let home = tempfile::tempdir().unwrap();
    let path = write_config(
        &home,
        "host = \"http://10.0.0.2:8083\"\nuser = \"admin\"\npass = \"hunter2\"\nignore = [12]\n",
    );
    zwlock_cmd(home.path())
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("********")
                .and(predicate::str::contains("10.0.0.2"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_lock_without_config_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = zwlock_cmd(home.path())
        .args(["lock", "5", "--config"])
        .arg(home.path().join("missing.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Configuration file not found"), "Expected config error:\n{text}");
}

// ── Accessories ─────────────────────────────────────────────────────

#[test]
fn test_accessories_lists_persisted_records() {
    let home = tempfile::tempdir().unwrap();
    let storage = home.path().join("store");
    std::fs::create_dir_all(&storage).unwrap();
    std::fs::write(
        storage.join("accessories.json"),
        json!([{
            "node_id": 5,
            "display_name": "Front Door",
            "lock_state": "secured",
            "target_state": "secured",
            "battery": 55,
            "configuration": { "beeper": true, "vacation_mode": false },
            "last_configuration_update": 1_700_000_000
        }])
        .to_string(),
    )
    .unwrap();

    let output = zwlock_cmd(home.path())
        .args(["accessories", "-o", "json", "--storage-dir"])
        .arg(&storage)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["node_id"], 5);
    assert_eq!(parsed[0]["display_name"], "Front Door");
    assert_eq!(parsed[0]["lock_state"], "secured");
}

#[test]
fn test_accessories_plain_with_empty_store() {
    let home = tempfile::tempdir().unwrap();
    zwlock_cmd(home.path())
        .args(["acc", "-o", "plain", "--storage-dir"])
        .arg(home.path().join("empty"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ── Against a gateway ───────────────────────────────────────────────

async fn mock_gateway() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ZWAYSession=tok123456; Path=/")
                .set_body_json(json!({ "data": { "id": 1 } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "controller": { "data": { "vendor": { "value": "RaZberry" } } },
            "updateTime": 1_000,
            "devices": {
                "1": { "data": {
                    "givenName": { "value": "Controller" },
                    "vendorString": { "value": "RaZberry" },
                    "deviceTypeString": { "value": "Static PC Controller" }
                }, "instances": {} },
                "5": {
                    "data": {
                        "givenName": { "value": "Front Door" },
                        "vendorString": { "value": "Allegion" },
                        "deviceTypeString": { "value": "Secure Keypad" }
                    },
                    "instances": { "0": { "commandClasses": {
                        "98": { "name": "DoorLock", "data": {
                            "mode": { "type": "int", "value": 255, "updateTime": 1_000 }
                        } },
                        "128": { "name": "Battery", "data": {
                            "last": { "type": "int", "value": 90, "updateTime": 1_000 }
                        } }
                    } } }
                }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/ZWave\.zway/Run/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;
    server
}

fn gateway_config(home: &TempDir, server: &MockServer) -> std::path::PathBuf {
    let storage = home.path().join("store");
    write_config(
        home,
        &format!(
            "host = \"{}\"\nuser = \"admin\"\nstorage_dir = \"{}\"\n",
            server.uri(),
            storage.display()
        ),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lock_posts_door_lock_set() {
    let server = mock_gateway().await;
    let home = tempfile::tempdir().unwrap();
    let config = gateway_config(&home, &server);

    let mut cmd = zwlock_cmd(home.path());
    cmd.env("ZWLOCK_PASS", "hunter2")
        .args(["lock", "5", "--config"])
        .arg(&config);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Locking node 5"));

    let runs: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.url.path().to_owned())
        .filter(|p| p.starts_with("/ZWave.zway/Run/"))
        .collect();
    assert!(
        runs.iter()
            .any(|p| p.ends_with("commandClasses[98].Set(255)")),
        "expected a DoorLock.Set(255), got {runs:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_node_exits_not_found() {
    let server = mock_gateway().await;
    let home = tempfile::tempdir().unwrap();
    let config = gateway_config(&home, &server);

    let mut cmd = zwlock_cmd(home.path());
    cmd.env("ZWLOCK_PASS", "hunter2")
        .args(["unlock", "9", "--config"])
        .arg(&config);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_json_marks_tracked_lock() {
    let server = mock_gateway().await;
    let home = tempfile::tempdir().unwrap();
    let config = gateway_config(&home, &server);

    let mut cmd = zwlock_cmd(home.path());
    cmd.env("ZWLOCK_PASS", "hunter2")
        .args(["devices", "-o", "json", "--config"])
        .arg(&config);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["node_id"], 1);
    assert_eq!(parsed[0]["status"], "unsupported");
    assert_eq!(parsed[1]["node_id"], 5);
    assert_eq!(parsed[1]["status"], "tracked");
    assert_eq!(parsed[1]["lock_state"], "secured");
    assert_eq!(parsed[1]["battery"], 90);
}
