//! Full runs against the memory backend

use crate::prelude::*;

#[test]
fn default_scenario_serializes_five_workers() {
    let output = quick_run().passes();

    assert_eq!(output.stdout_count("acquired lock in"), 5);
    assert_eq!(output.stdout_count("released lock in"), 5);
    output.stdout_has("test1/1").stdout_has("exited");
}

#[test]
fn exited_is_the_last_line() {
    let output = quick_run().args(&["-n", "2"]).passes();

    let last = output.stdout.lines().last().unwrap_or_default();
    assert!(last.contains("exited"), "last line: {last}");
}

#[test]
fn custom_lock_key() {
    quick_run()
        .args(&["-n", "1", "--namespace", "billing", "--lock-id", "nightly"])
        .passes()
        .stdout_has("billing/nightly");
}
