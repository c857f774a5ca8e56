//! Integration tests for the `web888` CLI binary.
//!
//! Argument parsing, help output, completions, config file management, and
//! one-shot status against a mock receiver.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `web888` binary with env isolation.
///
/// Clears all `WEB888_*` env vars and points the config file into `dir`
/// so tests never touch the user's real configuration or keyring entries.
fn web888_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("web888");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("WEB888_CONFIG", dir.join("config.toml"))
        .env_remove("WEB888_PROFILE")
        .env_remove("WEB888_HOST")
        .env_remove("WEB888_PORT")
        .env_remove("WEB888_MODE")
        .env_remove("WEB888_OUTPUT")
        .env_remove("WEB888_TIMEOUT")
        .env_remove("WEB888_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = TempDir::new().unwrap();
    let output = web888_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("status")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("web888"));
}

#[test]
fn test_completions_zsh() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_mode_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = web888_cmd(dir.path())
        .args(["--mode", "telnet", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("possible values"));
}

// ── Missing configuration ───────────────────────────────────────────

#[test]
fn test_status_without_receiver_fails_with_config_code() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .arg("status")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No receiver configured"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args(["--profile", "attic", "status"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("attic"));
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args([
            "config",
            "init",
            "--host",
            "rx.example.net",
            "--mode",
            "http",
            "--password-env",
            "SHACK_PW",
        ])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("host = \"rx.example.net\""));
    assert!(written.contains("default_profile = \"default\""));

    web888_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("rx.example.net")
                .and(predicate::str::contains("mode = \"http\""))
                .and(predicate::str::contains("SHACK_PW")),
        );

    // A second init without --force keeps the existing profile.
    web888_cmd(dir.path())
        .args(["config", "init", "--host", "other.example.net"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[profiles.default]\nhost = \"rx.local\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    web888_cmd(dir.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_use_requires_existing_profile() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args(["config", "use", "attic"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("attic"));
}

// ── Status against a receiver ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_http_mode_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "name=Rooftop\nusers=1\nusers_max=8\nuptime=3725\nsnr=21,18\ngps_good=7\nfixes=42\n",
        ))
        .mount(&server)
        .await;
    let port = server.address().port().to_string();

    let dir = TempDir::new().unwrap();
    let dir_path = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        web888_cmd(&dir_path)
            .args(["status", "--host", "127.0.0.1", "--port", &port, "-o", "json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["status"]["name"], "Rooftop");
    assert_eq!(snapshot["status"]["mode"], "http");
    assert_eq!(snapshot["status"]["connected"], true);
    assert_eq!(snapshot["status"]["gps"]["fixes"], 42);
    assert!(snapshot["status"]["channels"].is_null());
    assert_eq!(snapshot["thermal_threshold_c"], 70.0);
}

#[test]
fn test_status_unreachable_receiver_exit_code() {
    let dir = TempDir::new().unwrap();
    web888_cmd(dir.path())
        .args(["status", "--host", "127.0.0.1", "--port", "1", "--timeout", "2"])
        .assert()
        .code(predicate::in_iter([7, 8]));
}
