//! The uniform result envelope and the parser capability

use crate::error::Result;
use crate::process::ProcessExecutionResult;
use serde::{Deserialize, Serialize};

/// Result of one parsed invocation
///
/// `log` always carries the raw captured lines, whether or not parsing
/// succeeded. When `success` is `false`, `data` is the parser's zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    /// Whether the command succeeded and its output had the expected shape
    pub success: bool,
    /// Why it did not succeed; empty on success
    pub error: String,
    /// Raw stdout lines followed by stderr lines
    pub log: Vec<String>,
    /// The parsed payload
    pub data: T,
}

impl<T> CommandResponse<T> {
    /// A successful response
    pub fn ok(log: Vec<String>, data: T) -> Self {
        Self {
            success: true,
            error: String::new(),
            log,
            data,
        }
    }

    /// A failed response carrying an explicit payload
    pub fn failed_with(log: Vec<String>, error: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            error: error.into(),
            log,
            data,
        }
    }

    /// Transform the payload, keeping the verdict and log
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CommandResponse<U> {
        CommandResponse {
            success: self.success,
            error: self.error,
            log: self.log,
            data: f(self.data),
        }
    }

    /// The payload if successful, otherwise the error message
    pub fn into_result(self) -> std::result::Result<T, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.error)
        }
    }
}

impl<T: Default> CommandResponse<T> {
    /// A failed response with the zero-value payload
    pub fn failed(log: Vec<String>, error: impl Into<String>) -> Self {
        Self::failed_with(log, error, T::default())
    }

    /// Fail with the process's own failure message if it timed out or exited non-zero
    ///
    /// This is the default success gate shared by most parsers.
    pub fn gate(result: &ProcessExecutionResult) -> Option<Self> {
        result
            .failure_message()
            .map(|message| Self::failed(result.log_lines(), message))
    }
}

/// Turns a raw process result into a typed response
///
/// Implementations are pure: the response depends on nothing but the given
/// result. Expected malformations (empty or short output) are reported as a
/// failed response. An `Err` is reserved for input outside the parser's known
/// vocabulary, where guessing would corrupt data.
pub trait ResponseParser {
    /// The payload type produced on success
    type Output;

    /// Parse one process result
    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Self::Output>>;
}

impl<P: ResponseParser + ?Sized> ResponseParser for &P {
    type Output = P::Output;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Self::Output>> {
        (**self).parse(result)
    }
}
