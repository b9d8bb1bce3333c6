//! One-shot process execution with full output capture

use crate::command::Command;
use crate::config::ExecutorConfig;
use crate::error::{Error, Result};
use crate::process::{NO_EXIT_CODE, ProcessExecutionResult};
use crate::resolver::BinaryDescriptor;
use async_io::Timer;
use futures_lite::future;
use futures_lite::io::{AsyncRead, AsyncReadExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-invocation settings
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// Working directory for the process
    pub cwd: Option<PathBuf>,
    /// Environment overrides, merged over the inherited environment
    pub env: HashMap<String, String>,
    /// Wall-clock limit after which the process is killed
    pub timeout: Option<Duration>,
}

impl InvocationOptions {
    /// Options with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Run in the given directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Kill the process if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Runs a process to completion and captures stdout and stderr in memory
#[derive(Debug, Clone, Default)]
pub struct CommandInvoker {
    default_timeout: Option<Duration>,
    base_env: HashMap<String, String>,
}

impl CommandInvoker {
    /// Create an invoker without a default timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an invoker using the timeout and environment from a configuration
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            default_timeout: config.default_timeout(),
            base_env: config.env.clone(),
        }
    }

    /// Apply `timeout` to invocations that do not set their own
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Build the command for a binary, argument string and options
    pub fn command(
        &self,
        descriptor: &BinaryDescriptor,
        arguments: &str,
        options: &InvocationOptions,
    ) -> Result<Command> {
        let mut command = Command::for_binary(descriptor, arguments)?;
        command.envs(&self.base_env);
        command.envs(&options.env);
        if let Some(dir) = &options.cwd {
            command.current_dir(dir);
        }
        Ok(command)
    }

    /// Run a resolved binary with a composed argument string and wait for it to exit
    ///
    /// Fails if the binary is unresolved or cannot be spawned. A timeout is not an
    /// error: the process is killed and the result carries `timed_out`.
    pub async fn execute(
        &self,
        descriptor: &BinaryDescriptor,
        arguments: &str,
        options: &InvocationOptions,
    ) -> Result<ProcessExecutionResult> {
        let command = self.command(descriptor, arguments, options)?;
        self.run(&command, options.timeout.or(self.default_timeout))
            .await
    }

    /// Run a prepared command and wait for it to exit
    pub async fn run(
        &self,
        command: &Command,
        timeout: Option<Duration>,
    ) -> Result<ProcessExecutionResult> {
        let cmd_display = command.display();
        debug!("Executing: {}", cmd_display);

        let mut child = command
            .prepare()
            .spawn()
            .map_err(|e| Error::spawn_failed(&cmd_display, e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let started = Instant::now();

        // Owned out here so output read before a timeout survives the race
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let collect = async {
            let (out, err) = future::zip(
                read_into(stdout, &mut stdout_buf),
                read_into(stderr, &mut stderr_buf),
            )
            .await;
            out?;
            err?;
            Ok::<_, Error>(child.status().await?)
        };

        let outcome = match timeout {
            Some(limit) => {
                future::or(async { Some(collect.await) }, async {
                    Timer::after(limit).await;
                    None
                })
                .await
            }
            None => Some(collect.await),
        };

        let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_buf).into_owned();

        match outcome {
            Some(status) => {
                let exit_code = status?.code().unwrap_or(NO_EXIT_CODE);
                debug!(
                    "{} exited with {} after {:?}",
                    cmd_display,
                    exit_code,
                    started.elapsed()
                );
                Ok(ProcessExecutionResult::new(cmd_display, stdout, stderr, exit_code))
            }
            None => {
                // Only reachable when a timeout was set
                let limit = timeout.unwrap_or_default();
                warn!("{} timed out after {:?}, killing", cmd_display, limit);
                if let Err(e) = child.kill() {
                    warn!("Failed to kill {}: {}", cmd_display, e);
                }
                let _ = child.status().await;
                Ok(ProcessExecutionResult::new(cmd_display, stdout, stderr, NO_EXIT_CODE)
                    .with_timeout(limit))
            }
        }
    }
}

/// Append everything `reader` yields to `buf`, chunk by chunk
///
/// Bytes already appended stay in `buf` if the future is dropped midway.
async fn read_into<R: AsyncRead + Unpin>(reader: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(mut reader) = reader else {
        return Ok(());
    };
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
