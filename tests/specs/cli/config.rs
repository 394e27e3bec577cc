//! Config file and environment specs

use crate::prelude::*;

#[test]
fn config_file_sets_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lockrace.toml");
    std::fs::write(
        &path,
        "concurrency = 2\nwork_duration = \"10ms\"\nbackend = \"memory\"\n\n[lock]\nnamespace = \"jobs\"\n",
    )
    .unwrap();

    let output = lockrace()
        .args(&["--config", path.to_str().unwrap()])
        .passes();

    assert_eq!(output.stdout_count("released lock in"), 2);
    output.stdout_has("jobs/1");
}

#[test]
fn unknown_config_field_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lockrace.toml");
    std::fs::write(&path, "workers = 3\n").unwrap();

    lockrace()
        .args(&["--config", path.to_str().unwrap()])
        .fails()
        .stderr_has("unknown field");
}

#[test]
fn environment_overrides_apply() {
    let output = lockrace()
        .env("LOCKRACE_BACKEND", "memory")
        .env("LOCKRACE_CONCURRENCY", "3")
        .env("LOCKRACE_WORK", "10ms")
        .passes();

    assert_eq!(output.stdout_count("released lock in"), 3);
}

#[test]
fn log_file_receives_output() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs").join("lockrace.log");

    let output = quick_run()
        .args(&["--log-file", log.to_str().unwrap()])
        .passes();

    assert_eq!(output.stdout_count("acquired lock in"), 0);
    let logged = std::fs::read_to_string(&log).unwrap();
    assert!(logged.contains("acquired lock in"), "log file:\n{logged}");
    assert!(logged.contains("exited"), "log file:\n{logged}");
}
