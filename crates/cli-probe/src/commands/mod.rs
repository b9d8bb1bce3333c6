pub mod render;
pub mod resolve;
pub mod run;
pub mod stream;

use clap::ValueEnum;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable, payload only
    Text,
    /// The whole response as pretty JSON
    Json,
}

/// Which response parser interprets the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParserKind {
    /// Stdout lines as they are
    List,
    /// The first stdout line
    Scalar,
    /// A whitespace-aligned process table (`top`)
    Table,
    /// One container from `inspect`
    Inspect,
    /// Any single JSON object, optionally wrapped in a one-element array
    Json,
    /// A JSON array of objects
    JsonArray,
    /// `export NAME=VALUE` / `SET NAME=VALUE` lines
    KeyValue,
    /// `<code> <path>` change lines
    Diff,
    /// `;`-joined records, needs `--columns`
    Delimited,
    /// `ps --format` output with the container summary template
    Ps,
    /// Always succeeds, reports the exit code
    IgnoreError,
    /// Succeeds iff the exit code is 0
    ExitCode,
}
