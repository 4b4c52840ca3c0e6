//! Integration tests for the vaultsource binary.
//!
//! These tests only exercise paths that never reach a secrets store:
//! disabled resolution, plain values and configuration checks.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to write a configuration file into a temporary directory.
fn write_config(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("vaultsource.toml"), contents).unwrap();
    dir
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vaultsource"))
        .arg("--config")
        .arg(dir.path().join("vaultsource.toml"))
        .args(args)
        .env_remove("VAULT_ADDR")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_resolve_plain_value_is_printed_unchanged() {
    let dir = write_config("[vault]\nenabled = true\nbase-url = \"http://127.0.0.1:1\"\n");
    let output = run(&dir, &["resolve", "localhost:5432"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "localhost:5432\n");
}

#[test]
fn test_resolve_disabled_leaves_placeholder() {
    let dir = write_config("[vault]\nenabled = false\n");
    let output = run(&dir, &["resolve", "vault://db#password"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "vault://db#password\n");
}

#[test]
fn test_render_flattens_and_passes_through_when_disabled() {
    let dir = write_config("[vault]\nenabled = false\n");
    let app = dir.path().join("app.toml");
    fs::write(&app, "[db]\nhost = \"localhost\"\nport = 5432\npassword = \"vault://db#password\"\n").unwrap();

    let output = run(&dir, &["render", app.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "db.host=localhost\ndb.password=vault://db#password\ndb.port=5432\n"
    );

    let output = run(&dir, &["render", app.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["db.port"], "5432");
}

#[test]
fn test_load_disabled_prints_nothing() {
    let dir = write_config("[vault]\nenabled = false\nproperties = \"a.b, c\"\n");
    let output = run(&dir, &["load"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unresolvable_placeholder_fails() {
    let dir = write_config("[vault]\nenabled = true\nbase-url = \"http://127.0.0.1:1\"\n");
    let output = run(&dir, &["resolve", "vault://db#password"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("tokenSource not set"));
}

#[test]
fn test_check_config_does_not_print_user_id() {
    let dir = write_config(
        "[vault]\nenabled = true\nbase-url = \"http://vault:8200\"\ntoken-source = \"login\"\napp-id = \"app\"\nuser-id = \"very-secret-user\"\n",
    );
    let output = run(&dir, &["check-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Login"));
    assert!(!stdout.contains("very-secret-user"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["check-config"]);
    assert!(!output.status.success());
}
