//! End-to-end tests that invoke the compiled `ember` launcher.

use assert_cmd::Command;
use ember_test_utils::LayoutDir;
use predicates::prelude::*;
use std::fs;

/// The launcher with an empty environment
fn ember() -> Command {
    let mut cmd = Command::cargo_bin("ember").expect("ember binary should be built");
    cmd.env_clear();
    cmd
}

fn report(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("launcher should print a JSON report")
}

#[test]
fn test_version_exits_zero() {
    ember()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Ember "))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_help_exits_zero() {
    ember()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("usage:"))
        .stdout(predicate::str::contains("-c cmd"));
}

#[test]
fn test_command_is_reported_with_final_argv() {
    let output = ember()
        .args(["-O", "-c", "pass", "a", "b"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = report(&output);
    assert_eq!(report["mode"]["kind"], "command");
    assert_eq!(report["mode"]["target"], "pass");
    assert_eq!(report["config"]["optimization_level"], 1);
    assert_eq!(report["config"]["argv"], serde_json::json!(["-c", "a", "b"]));
}

#[test]
fn test_existing_script_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let script = dir.path().join("main.em");
    fs::write(&script, "pass\n").unwrap();

    let output = ember()
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(report(&output)["mode"]["kind"], "script");
}

#[test]
fn test_missing_script_exits_two() {
    ember()
        .arg("does-not-exist.em")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("can't open file"));
}

#[test]
fn test_unknown_option_is_fatal() {
    ember()
        .arg("-Z")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fatal error"))
        .stderr(predicate::str::contains("unknown option -Z"));
}

#[test]
fn test_bad_environment_value_is_fatal() {
    ember()
        .env("EMBER_HASHSEED", "often")
        .args(["-c", "pass"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("EMBER_HASHSEED"));
}

#[test]
fn test_ignore_environment_option_skips_bad_values() {
    ember()
        .env("EMBER_HASHSEED", "often")
        .args(["-E", "-c", "pass"])
        .assert()
        .success();
}

#[test]
fn test_conflicting_run_modes_are_fatal() {
    ember()
        .env("EMBER_RUN_COMMAND", "pass")
        .env("EMBER_RUN_MODULE", "pkg")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("conflicting run modes"));
}

#[test]
fn test_layout_file_beside_executable_is_read() {
    let dir = LayoutDir::new();
    let source = assert_cmd::cargo::cargo_bin("ember");
    let executable = dir.executable().with_extension(std::env::consts::EXE_EXTENSION);
    fs::copy(&source, &executable).unwrap();
    dir.write_layout("home = \"/srv/ember\"\nwrite_bytecode = false\n");

    let output = Command::new(&executable)
        .env_clear()
        .args(["-c", "pass"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = report(&output);
    assert_eq!(report["config"]["home"], "/srv/ember");
    assert_eq!(report["config"]["write_bytecode"], false);
}
