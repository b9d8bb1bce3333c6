//! Runtime-agnostic execution layer for container CLI tools
//!
//! This crate runs external tool binaries (docker, podman, docker-compose and
//! friends) as child processes and hands their output to typed parsers:
//!
//! - [`BinaryResolver`] maps a logical name to an executable, with a shared cache.
//! - [`CommandInvoker`] runs a process to completion and captures its output.
//! - [`StreamingInvoker`] follows stdout of a long-running process as a
//!   cancellable [`ConsoleStream`].
//! - [`ResponseParser`] turns a [`ProcessExecutionResult`] into a
//!   [`CommandResponse`]. Concrete parsers live in the `response-parsers` crate.

#![warn(missing_docs)]

pub mod args;
pub mod cancel;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod process;
pub mod resolver;
pub mod response;
pub mod stream;

pub use cancel::CancellationToken;
pub use command::Command;
pub use config::{ExecutorConfig, ResolverConfig};
pub use error::{Error, Result};
pub use executor::Executor;
pub use invoker::{CommandInvoker, InvocationOptions};
pub use process::{NO_EXIT_CODE, ProcessExecutionResult};
pub use resolver::{BinaryDescriptor, BinaryResolver, ResolveOptions, SearchEnvironment};
pub use response::{CommandResponse, ResponseParser};
pub use stream::{ConsoleStream, StreamingInvoker};
