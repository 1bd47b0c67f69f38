//! Shared helpers for behavioral specs

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub use similar_asserts::assert_eq;

const CONFIG: &str = r#"
[paths]
data_dir = "data"
backups_dir = "backups"
state_dir = "state"

[backup]
tick = "200ms"

[sync]
enabled = false
"#;

/// A temporary project directory with an `frd.toml`
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("frd.toml"), CONFIG).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self, id: &str) -> PathBuf {
        self.path().join("data").join(id)
    }

    pub fn state(&self, name: &str) -> PathBuf {
        self.path().join("state").join(name)
    }

    pub fn corrupt(&self, id: &str) {
        std::fs::write(self.store(id), b"definitely not sqlite").unwrap();
    }

    pub fn frd(&self) -> CliRun {
        let mut cmd = Command::cargo_bin("frd").unwrap();
        cmd.current_dir(self.path())
            .env_remove("FRD_API_KEY")
            .env_remove("FRD_CONFIG");
        CliRun { cmd }
    }

    /// Start `frdd` in this project and wait for it to print READY
    pub fn start_daemon(&self) -> Daemon {
        let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("frdd"))
            .current_dir(self.path())
            .env_remove("FRD_API_KEY")
            .env_remove("FRD_CONFIG")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "READY");
        Daemon { child }
    }
}

/// Builder around one `frd` invocation
pub struct CliRun {
    cmd: Command,
}

impl CliRun {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunOutput {
        RunOutput::from(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> RunOutput {
        RunOutput::from(self.cmd.assert().failure())
    }
}

pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

impl From<assert_cmd::assert::Assert> for RunOutput {
    fn from(assert: assert_cmd::assert::Assert) -> Self {
        let output = assert.get_output();
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunOutput {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}:\n{}",
            self.stderr
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

/// A running `frdd`; killed on drop if the test did not stop it
pub struct Daemon {
    child: Child,
}

impl Daemon {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send SIGTERM and wait for a clean exit
    pub fn stop(mut self) -> std::process::ExitStatus {
        std::process::Command::new("kill")
            .args(["-TERM", &self.pid().to_string()])
            .status()
            .unwrap();
        self.child.wait().unwrap()
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll `check` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}
