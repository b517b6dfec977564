//! Integration tests for the `scarlett-mixer` binary.
//!
//! Hardware is replaced by snapshot files written from the library's mock
//! endpoint, so every command that needs a card runs with `--snapshot`.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use scarlett_mixer_lib::endpoint::mock::{self, MockEndpoint};
use scarlett_mixer_lib::snapshot::ControlSnapshot;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("scarlett-mixer")
}

fn write_snapshot(dir: &Path, ep: &MockEndpoint) -> PathBuf {
    let path = dir.join("card.json");
    ControlSnapshot::capture(ep).unwrap().save(&path).unwrap();
    path
}

fn snapshot_18i6(dir: &Path) -> PathBuf {
    write_snapshot(dir, &mock::scarlett_18i6())
}

fn json_of(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("command should produce valid JSON")
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = cli().args(args).assert().success().get_output().stdout.clone();
    json_of(&output)
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scarlett-mixer"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_json_produces_valid_json() {
    let json = run_json(&["--json", "config"]);
    assert!(
        json["settings"].is_object(),
        "JSON output should contain 'settings' object"
    );
    assert!(
        json["config_file"].is_string() || json["config_file"].is_null(),
        "config_file should be string or null"
    );
}

#[test]
fn cli_config_file_and_flags_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "device = \"hw:7\"\npoll_interval_ms = 10\n").unwrap();
    let p = path.to_str().unwrap();

    let json = run_json(&["--json", "--config", p, "config"]);
    assert_eq!(json["settings"]["device"], "hw:7");
    assert_eq!(json["settings"]["poll_interval_ms"], 10);
    assert_eq!(json["config_file_exists"], true);

    let json = run_json(&["--json", "--config", p, "--device", "hw:3", "--preset-only", "config"]);
    assert_eq!(json["settings"]["device"], "hw:3");
    assert_eq!(json["settings"]["autodetect"], false);
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    cli().args(["-v", "config"]).assert().success();
}

#[test]
fn cli_verbose_long_flag_accepted() {
    cli().args(["--verbose", "--verbose", "config"]).assert().success();
}

// ── Cards ──

#[test]
fn cli_devices_succeeds() {
    cli().arg("devices").assert().success();
}

#[test]
fn cli_devices_json_counts_cards() {
    let json = run_json(&["--json", "devices"]);
    assert_eq!(
        json["count"].as_u64().unwrap() as usize,
        json["cards"].as_array().unwrap().len()
    );
}

#[test]
fn cli_probe_unknown_device_fails() {
    cli()
        .args(["--device", "hw:99", "probe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ── Layout ──

#[test]
fn cli_probe_snapshot_uses_derived_layout() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    cli()
        .args(["--snapshot", snap.to_str().unwrap(), "probe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scarlett 18i6 USB"))
        .stdout(predicate::str::contains("autodetected"))
        .stdout(predicate::str::contains("18 x 6"));
}

#[test]
fn cli_probe_preset_only_uses_static_layout() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let json = run_json(&["--json", "--preset-only", "--snapshot", snap.to_str().unwrap(), "probe"]);
    assert_eq!(json["profile_source"], "static");
    assert_eq!(json["control_count"], 158);
    assert_eq!(json["profile"]["matrix_inputs"], 18);
    assert_eq!(json["profile"]["matrix_outputs"], 6);
    assert_eq!(json["profile"]["master"], 0);
}

#[test]
fn cli_probe_unsupported_card_fails() {
    let dir = tempfile::tempdir().unwrap();
    let controls = mock::scarlett_18i6_controls().into_iter().take(12).collect();
    let snap = write_snapshot(dir.path(), &MockEndpoint::new("Scarlett 2i2 USB", controls));
    cli()
        .args(["--snapshot", snap.to_str().unwrap(), "probe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported device: Scarlett 2i2 USB"));
}

#[test]
fn cli_detect_reports_complete_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let snap = write_snapshot(dir.path(), &mock::column_major());
    let json = run_json(&["--json", "detect", snap.to_str().unwrap()]);
    assert_eq!(json["card_name"], "Scarlett 6i6 USB Gen 2");
    assert_eq!(json["complete"], true);
    assert_eq!(json["adopted"], "detected");
    assert_eq!(json["candidate"]["matrix_order"], "column-major");
}

#[test]
fn cli_detect_missing_file_fails() {
    cli()
        .args(["detect", "/nonexistent/card.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Snapshot error"));
}

#[test]
fn cli_dump_round_trips_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let copy = dir.path().join("copy.json");
    cli()
        .args(["--snapshot", snap.to_str().unwrap(), "dump", "--output"])
        .arg(&copy)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 158 controls"));
    assert_eq!(
        ControlSnapshot::load(&snap).unwrap(),
        ControlSnapshot::load(&copy).unwrap()
    );
}

// ── Writes against a snapshot ──

#[test]
fn cli_set_gain_is_saved_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let s = snap.to_str().unwrap();

    cli()
        .args(["--snapshot", s, "set", "bus:1", "-6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bus:1 = -6dB"));

    let saved = ControlSnapshot::load(&snap).unwrap();
    assert_eq!(saved.controls[4].playback_db, vec![-600, -600]);

    cli()
        .args(["--snapshot", s, "get", "bus:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bus:1 = -6dB (live)"));
}

#[test]
fn cli_set_mute_and_selector() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let s = snap.to_str().unwrap();

    cli().args(["--snapshot", s, "set", "master", "mute"]).assert().success();
    cli().args(["--snapshot", s, "set", "capture:2", "5"]).assert().success();

    let saved = ControlSnapshot::load(&snap).unwrap();
    assert_eq!(saved.controls[0].playback_switch, vec![false, false]);
    assert_eq!(saved.controls[13 + 2].item, 5);
}

#[test]
fn cli_set_rejects_wrong_value() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    cli()
        .args(["--snapshot", snap.to_str().unwrap(), "set", "hiz:0", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn cli_set_rejects_unknown_control() {
    cli()
        .args(["set", "fader:1", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid control"));
}

#[test]
fn cli_solo_routes_one_cell() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let json = run_json(&["--json", "--snapshot", snap.to_str().unwrap(), "solo", "0", "0"]);
    // All cells start off: only the target moves.
    assert_eq!(json["writes"], 1);
    let saved = ControlSnapshot::load(&snap).unwrap();
    assert_eq!(saved.controls[33].playback_db, vec![0]);
}

#[test]
fn cli_reset_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let before = ControlSnapshot::load(&snap).unwrap();
    let json = run_json(&["--json", "--snapshot", snap.to_str().unwrap(), "reset"]);
    assert!(json["total"].as_u64().unwrap() > 0);
    assert_eq!(json["report"]["switches"], 2);
    assert_eq!(ControlSnapshot::load(&snap).unwrap(), before);
}

#[test]
fn cli_defaults_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    let s = snap.to_str().unwrap();
    cli().args(["--snapshot", s, "defaults"]).assert().success();
    cli()
        .args(["--snapshot", s, "get", "capture:0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capture:0 = 7"));
    cli()
        .args(["--snapshot", s, "get", "matrix:3:2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matrix:3:2 = +0dB"));
}

#[test]
fn cli_monitor_stops_after_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot_18i6(dir.path());
    cli()
        .args(["--snapshot", snap.to_str().unwrap(), "monitor", "--ticks", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monitoring Scarlett 18i6 USB"))
        .stdout(predicate::str::contains("0 change(s)"));
}
