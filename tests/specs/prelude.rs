//! Shared helpers for lockrace specs

use std::path::PathBuf;
use std::process::Command as StdCommand;

pub use std::time::Duration;

/// Path to the built `lockrace` binary
pub fn binary() -> PathBuf {
    assert_cmd::cargo::cargo_bin("lockrace")
}

/// Environment every run starts from: no inherited overrides, plain output
fn scrub(cmd: &mut StdCommand) {
    for (key, _) in std::env::vars() {
        if key.starts_with("LOCKRACE_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("RUST_LOG", "info").env("NO_COLOR", "1");
}

/// A `lockrace` invocation under construction
pub struct Lockrace {
    cmd: StdCommand,
}

/// Start building a `lockrace` invocation
pub fn lockrace() -> Lockrace {
    let mut cmd = StdCommand::new(binary());
    scrub(&mut cmd);
    Lockrace { cmd }
}

/// Memory backend, short work: finishes in well under a second
pub fn quick_run() -> Lockrace {
    lockrace().args(&["--backend", "memory", "--work", "20ms"])
}

impl Lockrace {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Hand over the raw command, e.g. to spawn it
    pub fn command(self) -> StdCommand {
        self.cmd
    }

    /// Run and require exit status 0
    pub fn passes(self) -> RunOutput {
        let output = self.run_raw();
        assert!(
            output.success,
            "expected success, got failure\nstdout:\n{}\nstderr:\n{}",
            output.stdout, output.stderr
        );
        output
    }

    /// Run and require exit status 1
    pub fn fails(self) -> RunOutput {
        let output = self.run_raw();
        assert_eq!(
            output.code,
            Some(1),
            "expected exit 1\nstdout:\n{}\nstderr:\n{}",
            output.stdout,
            output.stderr
        );
        output
    }

    /// Run without asserting on the exit status
    pub fn run_raw(self) -> RunOutput {
        let output = assert_cmd::Command::from_std(self.cmd)
            .timeout(Duration::from_secs(30))
            .output()
            .unwrap();
        RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}\nstdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}\nstderr:\n{}",
            self.stderr
        );
        self
    }

    /// Number of stdout lines containing `needle`
    pub fn stdout_count(&self, needle: &str) -> usize {
        self.stdout.lines().filter(|l| l.contains(needle)).count()
    }
}
