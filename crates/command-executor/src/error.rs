//! Error types for command execution and response parsing

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the execution layer
///
/// Invocation-level failures (resolution, spawn) are returned as errors because the
/// command could not be attempted at all. Parse-level failures are normally recovered
/// into a failed [`CommandResponse`](crate::response::CommandResponse) instead; only
/// [`Error::UnsupportedFormat`] escapes from a parser.
#[derive(Error, Debug)]
pub enum Error {
    /// The logical binary name could not be mapped to an executable
    #[error("binary not found: {name}")]
    BinaryResolution {
        /// The logical name that was looked up
        name: String,
    },

    /// Failed to spawn a process
    #[error("failed to spawn {command}: {reason}")]
    SpawnFailed {
        /// The command line that was being started
        command: String,
        /// The reason for the spawn failure
        reason: String,
    },

    /// The process exceeded its wall-clock timeout and was killed
    #[error("{command} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// The command line that timed out
        command: String,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// Parser input fell outside the parser's known vocabulary
    #[error("unsupported {parser} output: {input}")]
    UnsupportedFormat {
        /// Name of the parser that rejected the input
        parser: &'static str,
        /// The offending input
        input: String,
    },

    /// Invalid configuration or argument string
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML configuration error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(parser: &'static str, input: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            parser,
            input: input.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
