//! CLI command integration tests.

use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nar_cmd() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("nar").unwrap();
    cmd.env_remove("NAR_CONFIG");
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn run_file_answers_question() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "tasks.nal",
        "// a belief and a question about it\n\n<a --> b>.\n<a --> b>?\n",
    );

    nar_cmd()
        .args(["run", "--cycles", "5"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("IN: <a --> b>. %1.00;0.90%"))
        .stdout(predicate::str::contains("IN: <a --> b>?"))
        .stdout(predicate::str::contains(
            "ANSWER: <a --> b>? => <a --> b>. %1.00;0.90%",
        ));
}

#[test]
fn run_reads_stdin_and_prints_json() {
    let output = nar_cmd()
        .args(["run", "--json", "--cycles", "1"])
        .write_stdin("$0.5;0.5;0.5$ <cat --> animal>.\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().expect("one report line");
    let report: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(report["kind"], "in");
    assert_eq!(report["content"], "<cat --> animal>. %1.00;0.90%");
    assert_eq!(report["clock"], 0);
}

#[test]
fn run_bare_integer_runs_cycles() {
    let output = nar_cmd()
        .args(["--verbose", "run", "--cycles", "0"])
        .write_stdin("<a --> b>.\n7\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("clock=7"), "stderr: {stderr}");
    assert!(stderr.contains("concepts=3"), "stderr: {stderr}");
}

#[test]
fn run_rejects_malformed_line() {
    nar_cmd()
        .arg("run")
        .write_stdin("<a --> b>.\n<a --> b\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<stdin>:2: invalid input line"));
}

#[test]
fn run_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    nar_cmd()
        .arg("run")
        .arg(dir.path().join("absent.nal"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn config_prints_defaults() {
    nar_cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("concept_bag_size = 1000"))
        .stdout(predicate::str::contains("bag_level = 100"));
}

#[test]
fn config_file_and_flag_overrides() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "nar.toml", "concept_bag_size = 50\ntask_buffer_size = 4\n");

    nar_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "--task-buffer-size", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("concept_bag_size = 50"))
        .stdout(predicate::str::contains("task_buffer_size = 2"));
}

#[test]
fn config_from_env() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "nar.toml", "term_link_bag_size = 9\n");

    nar_cmd()
        .env("NAR_CONFIG", &config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("term_link_bag_size = 9"));
}

#[test]
fn invalid_config_refuses_to_start() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "bad.toml", "bag_level = 0\nbag_threshold = 0\n");

    nar_cmd()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));

    nar_cmd()
        .args(["--concept-bag-size", "0", "run"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("concept_bag_size must be at least 1"));
}

#[test]
fn shell_exits_on_stdin_eof() {
    nar_cmd()
        .args(["shell", "--tick-ms", "1"])
        .write_stdin("<a --> b>.\n<a --> b>?\n5\n")
        .timeout(Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("IN: <a --> b>?"))
        .stdout(predicate::str::contains("ANSWER:"));
}

#[test]
fn shell_reports_bad_lines_and_continues() {
    nar_cmd()
        .args(["shell", "--tick-ms", "1"])
        .write_stdin("oops\n<x --> y>.\n")
        .timeout(Duration::from_secs(10))
        .assert()
        .success()
        .stderr(predicate::str::contains("error:"))
        .stdout(predicate::str::contains("IN: <x --> y>."));
}

#[test]
fn run_rejects_deeply_nested_line() {
    let line = format!("{}a{}.\n", "(*, ".repeat(50_000), ")".repeat(50_000));
    nar_cmd()
        .args(["run", "--cycles", "1"])
        .write_stdin(line)
        .assert()
        .failure()
        .stderr(predicate::str::contains("<stdin>:1: invalid input line"));
}
