// Integration tests for CLI commands
// These exercise argument parsing, config handling and the failure paths that
// stop before any network call.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

fn permafy(args: &[&str], config: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_permafy"))
        .args(args)
        .arg("--config")
        .arg(config)
        .env_remove("AR_WALLET_JSON")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_permafy"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Arweave"));
    assert!(stdout.contains("pin-many"));
    assert!(stdout.contains("init-config"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_permafy"))
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("permafy"));
}

#[test]
fn test_cli_pin_requires_cid() {
    let output = Command::new(env!("CARGO_BIN_EXE_permafy"))
        .arg("pin")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_cli_init_config_then_refuse_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let output = permafy(&["init-config"], &path);
    assert!(output.status.success());
    assert!(path.exists());

    let again = permafy(&["init-config"], &path);
    assert!(!again.status.success());
}

#[test]
fn test_cli_pin_without_wallet_fails() {
    let dir = TempDir::new().unwrap();
    let output = permafy(
        &["pin", "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"],
        &dir.path().join("absent.toml"),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("AR_WALLET_JSON"));
}

#[test]
fn test_cli_find_rejects_invalid_cid() {
    let dir = TempDir::new().unwrap();
    let output = permafy(&["find", "not-a-cid"], &dir.path().join("absent.toml"));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid CID: not-a-cid"));
}

#[test]
fn test_cli_pin_many_requires_cids() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("empty.txt");
    std::fs::write(&list, "\n\n").unwrap();

    let output = permafy(
        &["pin-many", "--from-file", list.to_str().unwrap()],
        &dir.path().join("absent.toml"),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no CIDs given"));
}

#[test]
fn test_cli_rejects_malformed_config() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[archive]").unwrap();
    writeln!(temp_file, "batch_size = \"ten\"").unwrap();

    let output = permafy(
        &["pin", "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"],
        temp_file.path(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse config file"));
}
