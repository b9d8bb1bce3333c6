//! Typed parsers for container CLI output
//!
//! Every parser implements [`command_executor::ResponseParser`]. They share
//! one contract: the raw log is always returned, expected malformations become
//! a failed [`CommandResponse`](command_executor::CommandResponse), and only
//! input outside a parser's vocabulary is an `Err`.

#![warn(missing_docs)]

pub mod delimited;
pub mod diff;
pub mod duration;
pub mod env;
pub mod json;
pub mod lines;
pub mod models;
pub mod table;

pub use delimited::{CONTAINER_SUMMARY_FORMAT, ContainerSummaryParser, DelimitedParser};
pub use diff::{DiffEntry, DiffKind, DiffParser};
pub use duration::parse_duration;
pub use env::KeyValueParser;
pub use json::{JsonArrayParser, JsonEnvelopeParser};
pub use lines::{IgnoreErrorParser, ListParser, NoDataParser, ScalarParser};
pub use models::{
    ContainerConfig, ContainerDetails, ContainerState, ContainerSummary, HealthState,
    NetworkSummary, VolumeDetails,
};
pub use table::{FieldValue, ProcessColumn, ProcessRow, ProcessTable, TableParser};
