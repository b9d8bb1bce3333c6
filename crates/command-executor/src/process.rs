//! Captured output of a finished process

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit code recorded when the process did not report one (killed by a signal)
pub const NO_EXIT_CODE: i32 = -1;

/// Raw, normalized capture of one process run
///
/// Both the whole stdout text and its line view are kept because parsers differ
/// in the granularity they need. Line endings are normalized to `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExecutionResult {
    /// The command line that was run
    pub command: String,
    /// Everything written to stdout
    pub stdout: String,
    /// Stdout split into lines, without a trailing empty line
    pub stdout_lines: Vec<String>,
    /// Everything written to stderr
    pub stderr: String,
    /// Process exit code, or [`NO_EXIT_CODE`]
    pub exit_code: i32,
    /// Set when the process was killed because it exceeded its timeout
    pub timed_out: Option<Duration>,
}

impl ProcessExecutionResult {
    /// Build a result from captured output
    pub fn new(
        command: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        let stdout = normalize_newlines(stdout.into());
        let stdout_lines = split_lines(&stdout);

        Self {
            command: command.into(),
            stdout,
            stdout_lines,
            stderr: normalize_newlines(stderr.into()),
            exit_code,
            timed_out: None,
        }
    }

    /// Build a successful result from stdout alone
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self::new(String::new(), stdout, String::new(), 0)
    }

    /// Mark the result as killed after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timed_out = Some(timeout);
        self
    }

    /// Whether the process exited with code 0 and did not time out
    pub fn exited_ok(&self) -> bool {
        self.exit_code == 0 && self.timed_out.is_none()
    }

    /// Stderr split into lines
    pub fn stderr_lines(&self) -> Vec<String> {
        split_lines(&self.stderr)
    }

    /// All captured lines: stdout first, then stderr
    pub fn log_lines(&self) -> Vec<String> {
        let mut log = self.stdout_lines.clone();
        log.extend(self.stderr_lines());
        log
    }

    /// A one-line description of why the process did not succeed
    ///
    /// Returns `None` when the process exited with code 0 and did not time out.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(timeout) = self.timed_out {
            return Some(format!("Timeout after {}ms", timeout.as_millis()));
        }
        if self.exit_code == 0 {
            return None;
        }

        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            Some(stderr.to_string())
        } else {
            let stdout = self.stdout.trim();
            if stdout.is_empty() {
                Some(format!("Exit code {}", self.exit_code))
            } else {
                Some(stdout.to_string())
            }
        }
    }

    /// Turn a timed-out result into [`Error::Timeout`]
    pub fn into_checked(self) -> Result<Self> {
        match self.timed_out {
            Some(timeout) => Err(Error::Timeout {
                command: self.command,
                timeout,
            }),
            None => Ok(self),
        }
    }
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
