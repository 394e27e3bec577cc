//! Help and version specs

use crate::prelude::*;

#[test]
fn help_lists_overrides() {
    lockrace()
        .args(&["--help"])
        .passes()
        .stdout_has("--concurrency")
        .stdout_has("--backend")
        .stdout_has("--lock-id")
        .stdout_has("LOCKRACE_CONCURRENCY");
}

#[test]
fn version_prints_name() {
    lockrace().args(&["--version"]).passes().stdout_has("lockrace");
}
