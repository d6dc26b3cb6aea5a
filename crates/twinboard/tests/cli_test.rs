//! Integration tests for the `twinboard` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a backend; the data commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `twinboard` binary with env isolation.
///
/// Clears all `TWINBOARD_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn twinboard_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("twinboard");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TWINBOARD_API_URL")
        .env_remove("TWINBOARD_BUILDING")
        .env_remove("TWINBOARD_OUTPUT")
        .env_remove("TWINBOARD_TIMEOUT")
        .env_remove("TWINBOARD_DEFAULT_BUILDING");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async test thread so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn building_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Building {id}"),
        "area_sqm": 8000.0,
        "floors": 3,
        "location": {
            "address": "Campus de Espinardo",
            "city": "Murcia",
            "country": "Spain",
            "latitude": 38.02,
            "longitude": -1.17
        },
        "year_built": 2010,
        "building_type": "University",
        "occupancy_rate": 64.0,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-06-15T10:30:00"
    })
}

async fn backend(ids: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let buildings: Vec<_> = ids.iter().map(|id| building_json(id)).collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/buildings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": buildings,
            "total": ids.len()
        })))
        .mount(&server)
        .await;
    server
}

/// Write `contents` as the config file the binary finds under `home`.
fn write_config(home: &Path, contents: &str) {
    let dir = home.join(".config").join("twinboard");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api/v1", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = twinboard_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("energy")
                .and(predicate::str::contains("simulate"))
                .and(predicate::str::contains("setpoint")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("twinboard"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .arg("teleport")
        .assert()
        .code(2);
}

#[test]
fn completions_bash() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn trend_hours_out_of_range_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .args(["iaq", "--trend-hours", "0"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_lives_under_home() {
    let home = tempfile::tempdir().unwrap();
    let output = twinboard_cmd(home.path())
        .args(["config", "path"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().ends_with("config.toml"), "got: {stdout}");
    assert!(
        Path::new(stdout.trim()).starts_with(home.path()),
        "got: {stdout}"
    );
}

#[test]
fn config_show_reports_defaults_and_flag_overrides() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://localhost:8000/api/v1")
                .and(predicate::str::contains("pleiades-a")),
        );

    twinboard_cmd(home.path())
        .args(["--building", "annex", "config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_building\": \"annex\""));
}

#[test]
fn theme_defaults_to_light_and_persists() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .args(["config", "theme"])
        .assert()
        .success()
        .stdout("light\n");

    twinboard_cmd(home.path())
        .args(["config", "theme", "dark"])
        .assert()
        .success();

    twinboard_cmd(home.path())
        .args(["config", "theme"])
        .assert()
        .success()
        .stdout("dark\n");
}

#[test]
fn invalid_theme_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    twinboard_cmd(home.path())
        .args(["config", "theme", "sepia"])
        .assert()
        .code(2);
}

// ── Validation & connectivity ───────────────────────────────────────

#[test]
fn setpoint_without_changes_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = twinboard_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9/api/v1", "setpoint", "--zone", "z1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--temperature"));
}

#[test]
fn unreachable_backend_exits_with_connection_code() {
    let home = tempfile::tempdir().unwrap();
    let output = twinboard_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9/api/v1", "--timeout", "5", "buildings", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[test]
fn non_http_api_url_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    let output = twinboard_cmd(home.path())
        .args(["--api-url", "ftp://example.com/api/v1", "buildings", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("api_url"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn buildings_list_as_json() {
    let server = backend(&["pleiades-a", "pleiades-b"]).await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "buildings", "list", "-o", "json"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(ids, ["pleiades-a", "pleiades-b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_output_format_applies_without_a_flag() {
    let server = backend(&["pleiades-a"]).await;
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "output = \"json\"\ncolor = \"never\"\n");

    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "buildings", "list"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["id"], "pleiades-a");

    // The flag still wins over the file
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "buildings", "list", "-o", "plain"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pleiades-a\n");
}

#[test]
fn unknown_configured_output_format_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "output = \"xml\"\n");
    let output = twinboard_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:9/api/v1", "kpis"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("output"));

    // Config commands fall back to the defaults instead
    twinboard_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_building_exits_with_not_found() {
    let server = backend(&["pleiades-a"]).await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "--building", "atlantis", "hvac"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("atlantis"), "{text}");
    assert!(text.contains("buildings list"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_building_list_exits_with_not_found() {
    let server = backend(&[]).await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "kpis"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("no buildings"));
}

#[tokio::test(flavor = "multi_thread")]
async fn hvac_zones_for_the_healed_selection() {
    let server = backend(&["pleiades-b"]).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/buildings/pleiades-b/hvac"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "building_id": "pleiades-b",
            "zones": [
                {
                    "id": "b-upper", "name": "Upper", "floor": 2,
                    "current_temp": 24.0, "setpoint": 22.0, "humidity": 50.0,
                    "occupancy": 4, "mode": "cooling"
                },
                {
                    "id": "b-lobby", "name": "Lobby", "floor": 0,
                    "current_temp": 21.0, "setpoint": 21.0, "humidity": 45.0,
                    "occupancy": 10, "mode": "auto"
                }
            ],
            "total_zones": 2,
            "avg_temperature": 22.5,
            "avg_humidity": 47.5,
            "cooling_load_kw": 12.0,
            "heating_load_kw": 0.0
        })))
        .mount(&server)
        .await;

    // Configured default `pleiades-a` is absent, so the first building wins
    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "hvac", "-o", "plain"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "b-lobby\nb-upper\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn live_feed_refused_by_backend_exits_with_connection_error() {
    // No WebSocket route is mounted, so the handshake gets a 404
    let server = backend(&["pleiades-a"]).await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "live", "--count", "1"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(7));
    let text = combined_output(&output);
    assert!(text.contains("/ws/buildings/pleiades-a/realtime"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_scenario_sends_parameters_as_body() {
    let server = backend(&["pleiades-a"]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/simulation/scenarios/custom"))
        .and(query_param("building_id", "pleiades-a"))
        .and(query_param("scenario_type", "setpoint_change"))
        .and(body_json(json!({ "setpoint_delta": -1.5, "label": "night" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scenario_id": "custom_setpoint_change",
            "scenario_name": "Custom: setpoint_change",
            "baseline_energy_kwh": 1000.0,
            "scenario_energy_kwh": 900.0,
            "energy_savings_kwh": 100.0,
            "energy_savings_percent": 10.0,
            "cost_savings_eur": 15.0,
            "carbon_savings_kg": 25.0,
            "comfort_impact": -0.2,
            "baseline_timeline": [],
            "scenario_timeline": [],
            "recommendations": []
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = twinboard_cmd(home.path());
    cmd.args([
        "--api-url",
        &api_url(&server),
        "simulate",
        "custom",
        "setpoint_change",
        "-p",
        "setpoint_delta=-1.5",
        "-p",
        "label=night",
        "-o",
        "plain",
    ]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "custom_setpoint_change");
}

#[tokio::test(flavor = "multi_thread")]
async fn report_is_written_to_the_requested_file() {
    let server = backend(&["pleiades-a"]).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/reports/pleiades-a/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 test".to_vec()),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let out_file = home.path().join("reports").join("june.pdf");
    let mut cmd = twinboard_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "report", "--period", "week", "--out"])
        .arg(&out_file)
        .args(["-o", "plain"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(std::fs::read(&out_file).unwrap(), b"%PDF-1.4 test");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        out_file.display().to_string()
    );
}
