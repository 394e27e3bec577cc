//! Termination signal specs
//!
//! A signal cancels the process scope: the holder cuts its work short and
//! releases, waiting workers abort, and the process exits 0.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::process::{Child, Stdio};
use std::sync::mpsc;
use std::time::Instant;

/// Spawn a long run and wait until a worker holds the lock
fn spawn_holding_run() -> (Child, mpsc::Receiver<String>) {
    let mut child = lockrace()
        .args(&["--backend", "memory", "--work", "60s"])
        .command()
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let line = rx
            .recv_timeout(remaining)
            .expect("no worker acquired the lock");
        if line.contains("acquired lock in") {
            return (child, rx);
        }
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::process::ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("lockrace did not exit within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn assert_clean_shutdown(signal: Signal, name: &str) {
    let (mut child, rx) = spawn_holding_run();

    kill(Pid::from_raw(child.id() as i32), signal).unwrap();
    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert!(status.success(), "expected exit 0, got {status:?}");

    let rest: Vec<String> = rx.try_iter().collect();
    let output = rest.join("\n");
    assert!(
        output.contains(&format!("exiting received signal {name}")),
        "stdout:\n{output}"
    );
    assert_eq!(
        rest.iter().filter(|l| l.contains("released lock in")).count(),
        1,
        "only the holder releases\nstdout:\n{output}"
    );
    // A waiter granted the lock in the same instant skips its work instead
    assert_eq!(
        rest.iter()
            .filter(|l| l.contains("lock acquisition stopped") || l.contains("lock acquire interrupted"))
            .count(),
        4,
        "waiting workers never work\nstdout:\n{output}"
    );
    assert!(output.contains("exited"), "stdout:\n{output}");
}

#[test]
fn sigint_stops_all_workers() {
    assert_clean_shutdown(Signal::SIGINT, "SIGINT");
}

#[test]
fn sigterm_stops_all_workers() {
    assert_clean_shutdown(Signal::SIGTERM, "SIGTERM");
}
