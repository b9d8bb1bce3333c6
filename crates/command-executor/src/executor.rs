//! Main executor type tying resolution, invocation and parsing together

use crate::cancel::CancellationToken;
use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::invoker::{CommandInvoker, InvocationOptions};
use crate::process::ProcessExecutionResult;
use crate::resolver::{BinaryDescriptor, BinaryResolver};
use crate::response::{CommandResponse, ResponseParser};
use crate::stream::{ConsoleStream, StreamingInvoker};
use std::sync::Arc;
use tracing::debug;

/// Runs tools by logical name and hands their output to a parser
///
/// The resolver is injected so several executors can share one cache.
#[derive(Debug, Clone)]
pub struct Executor {
    resolver: Arc<BinaryResolver>,
    invoker: CommandInvoker,
    streaming: StreamingInvoker,
}

impl Executor {
    /// Create an executor over a shared resolver
    pub fn new(resolver: Arc<BinaryResolver>, invoker: CommandInvoker) -> Self {
        Self {
            resolver,
            invoker,
            streaming: StreamingInvoker::new(),
        }
    }

    /// Create an executor, and its resolver, from configuration
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            resolver: Arc::new(BinaryResolver::new(config.resolver.clone())),
            invoker: CommandInvoker::from_config(config),
            streaming: StreamingInvoker::new().with_env(config.env.clone()),
        }
    }

    /// The shared resolver
    pub fn resolver(&self) -> &Arc<BinaryResolver> {
        &self.resolver
    }

    /// Resolve a logical name through the shared cache
    pub fn resolve(&self, name: &str) -> Arc<BinaryDescriptor> {
        self.resolver.resolve(name)
    }

    /// Run a tool and return its raw captured output
    pub async fn execute(
        &self,
        name: &str,
        arguments: &str,
        options: &InvocationOptions,
    ) -> Result<ProcessExecutionResult> {
        let descriptor = self.resolve(name);
        self.invoker.execute(&descriptor, arguments, options).await
    }

    /// Run a tool and parse its output
    pub async fn run<P: ResponseParser>(
        &self,
        name: &str,
        arguments: &str,
        options: &InvocationOptions,
        parser: &P,
    ) -> Result<CommandResponse<P::Output>> {
        let result = self.execute(name, arguments, options).await?;
        let response = parser.parse(&result)?;
        debug!(
            "{} -> success={} ({} log lines)",
            result.command,
            response.success,
            response.log.len()
        );
        Ok(response)
    }

    /// Start a tool and stream its mapped stdout lines
    pub fn stream<T, F>(
        &self,
        name: &str,
        arguments: &str,
        token: CancellationToken,
        mapper: F,
    ) -> Result<ConsoleStream<T>>
    where
        T: Send + 'static,
        F: FnMut(String) -> Option<T> + Send + 'static,
    {
        self.stream_with(name, arguments, &InvocationOptions::default(), token, mapper)
    }

    /// Like [`stream`](Self::stream) with a working directory and environment
    pub fn stream_with<T, F>(
        &self,
        name: &str,
        arguments: &str,
        options: &InvocationOptions,
        token: CancellationToken,
        mapper: F,
    ) -> Result<ConsoleStream<T>>
    where
        T: Send + 'static,
        F: FnMut(String) -> Option<T> + Send + 'static,
    {
        let descriptor = self.resolve(name);
        self.streaming
            .execute_with(&descriptor, arguments, options, token, mapper)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}
