#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dm() -> Command {
    let mut cmd = Command::cargo_bin("dm").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_prints_header_and_status() {
    dm().args(["simulate", "--ticks", "10"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Simulation")
                .and(predicate::str::contains("10 ticks, seed=42"))
                .and(predicate::str::contains("Entity Status"))
                .and(predicate::str::contains("Ayla"))
                .and(predicate::str::contains("Brother Aldous")),
        );
}

#[test]
fn simulate_verbose_shows_denials() {
    dm().args(["simulate", "--ticks", "6", "-v"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Event Log")
                .and(predicate::str::contains("Ayla arrives in Temple of Dawn."))
                .and(predicate::str::contains("You can't fight in a safe place."))
                .and(predicate::str::contains("The cellar hatch is locked.")),
        );
}

#[test]
fn simulate_zero_ticks_has_no_events() {
    dm().args(["simulate", "--ticks", "0", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no events)"));
}

#[test]
fn simulate_is_deterministic_per_seed() {
    let run = || {
        dm().args(["simulate", "--ticks", "40", "--seed", "9", "-v"])
            .output()
            .unwrap()
            .stdout
    };
    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}

#[test]
fn simulate_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.json");
    fs::write(&path, r#"{ "seed": 1234, "request_ttl": 3 }"#).unwrap();

    dm().args(["simulate", "--ticks", "3", "--config", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("seed=1234"));
}

#[test]
fn seed_flag_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.json");
    fs::write(&path, r#"{ "seed": 1234 }"#).unwrap();

    dm().args([
        "simulate",
        "--ticks",
        "3",
        "--config",
        path.to_str().unwrap(),
        "--seed",
        "5",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("seed=5"));
}

#[test]
fn simulate_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.json");
    fs::write(&path, r#"{ "request_ttl": 0 }"#).unwrap();

    dm().args(["simulate", "--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request_ttl must be at least 1"));
}

#[test]
fn simulate_fails_on_missing_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.json");

    dm().args(["simulate", "--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn simulate_dumps_world_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world.json");

    dm().args(["simulate", "--ticks", "5", "--dump", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("World state written to"));

    let text = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let records = value.as_array().unwrap();
    assert!(records.len() >= 8);
    assert!(text.contains("Town Square"));
}

// ---------------------------------------------------------------------------
// systems
// ---------------------------------------------------------------------------

#[test]
fn systems_lists_execution_order() {
    let output = dm().arg("systems").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    let positions: Vec<usize> = [
        "combat_initiation",
        "movement",
        "combat ",
        "death",
        "regeneration",
        "respawn",
    ]
    .iter()
    .map(|name| stdout.find(name).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{stdout}");
}

// ---------------------------------------------------------------------------
// misc
// ---------------------------------------------------------------------------

#[test]
fn unknown_subcommand_fails() {
    dm().arg("teleport").assert().failure();
}

#[test]
fn version_flag_works() {
    dm().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dm"));
}
