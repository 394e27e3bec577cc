//! Startup failure specs
//!
//! Startup failures exit 1 before any worker starts.

use crate::prelude::*;

#[test]
fn unreachable_consul_exits_1() {
    let output = lockrace()
        .args(&["--address", "127.0.0.1:1", "--work", "10ms"])
        .fails();

    output.stderr_has("error getting client");
    assert_eq!(output.stdout_count("acquired lock in"), 0);
}

#[test]
fn zero_concurrency_exits_1() {
    quick_run()
        .args(&["--concurrency", "0"])
        .fails()
        .stderr_has("concurrency must be at least 1");
}

#[test]
fn lock_id_with_delimiter_exits_1() {
    quick_run()
        .args(&["--lock-id", "a/b"])
        .fails()
        .stderr_has("lock id must not contain");
}

#[test]
fn unknown_backend_is_a_usage_error() {
    let output = lockrace().args(&["--backend", "etcd"]).run_raw();
    assert_eq!(output.code, Some(2), "clap reports usage errors with exit 2");
}
