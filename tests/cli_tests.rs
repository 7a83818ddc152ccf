//! CLI integration tests. None of these reach the network.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn forgekeeper() -> Command {
    let mut cmd = cargo_bin_cmd!("forgekeeper");
    cmd.env_remove("WALLET_PRIVATE_KEY")
        .env_remove("INFURA_API_KEY")
        .env_remove("FORGEKEEPER_RPC_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn help_lists_commands() {
    forgekeeper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mint"))
        .stdout(predicate::str::contains("forge"))
        .stdout(predicate::str::contains("trade"))
        .stdout(predicate::str::contains("balances"));
}

#[test]
fn version_names_binary() {
    forgekeeper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("forgekeeper"));
}

#[test]
fn assets_lists_catalog_and_recipes() {
    forgekeeper()
        .arg("assets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thor's Hammer"))
        .stdout(predicate::str::contains("forge: Bronze + Silver + Gold"));
}

#[test]
fn assets_json_is_machine_readable() {
    let output = forgekeeper()
        .args(["assets", "--json"])
        .output()
        .expect("run forgekeeper");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document");
    assert_eq!(value["command"], "assets");
    let assets = value["assets"].as_array().expect("assets array");
    assert_eq!(assets.len(), 7);
    assert_eq!(assets[6]["name"], "Dante's Key");
    assert_eq!(assets[6]["recipe"], serde_json::json!([0, 1, 2]));
    assert_eq!(assets[0]["primary"], true);
}

#[test]
fn config_validate_accepts_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");

    forgekeeper()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn config_validate_reports_bad_address() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[network]\nforge_contract = \"0x1234\"\n");

    forgekeeper()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("forge_contract"));
}

#[test]
fn config_validate_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();

    forgekeeper()
        .args(["config", "validate", "--config"])
        .arg(dir.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn config_show_masks_infura_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");

    forgekeeper()
        .env("INFURA_API_KEY", "0123456789abcdef0123456789abcdef")
        .args(["config", "show", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("sepolia.infura.io"))
        .stdout(predicate::str::contains("0123456789abcdef0123456789abcdef").not());
}

#[test]
fn minting_derived_kind_fails_before_connecting() {
    forgekeeper()
        .args(["mint", "shield", "--config", "/nonexistent/forgekeeper.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be minted"));
}

#[test]
fn self_trade_fails_before_connecting() {
    forgekeeper()
        .args(["trade", "--want", "silver", "--give", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("for itself"));
}

#[test]
fn unknown_asset_is_a_usage_error() {
    forgekeeper()
        .args(["forge", "mithril"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown asset"));
}
