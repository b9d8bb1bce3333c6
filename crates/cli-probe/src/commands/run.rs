use super::render::Render;
use super::{OutputFormat, ParserKind};
use anyhow::{Context, Result};
use command_executor::{Executor, InvocationOptions, ResponseParser};
use response_parsers::{
    ContainerDetails, ContainerSummaryParser, DelimitedParser, DiffParser, IgnoreErrorParser,
    JsonArrayParser, JsonEnvelopeParser, KeyValueParser, ListParser, NoDataParser, ScalarParser,
    TableParser,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the `run` subcommand was asked to do
pub struct RunRequest {
    pub name: String,
    pub args: String,
    pub parser: ParserKind,
    pub columns: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub format: OutputFormat,
}

/// Parse a `KEY=VALUE` pair
pub fn parse_env(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{value}'")),
    }
}

pub async fn run(executor: &Executor, request: RunRequest) -> Result<bool> {
    let mut options = InvocationOptions::new();
    if let Some(cwd) = &request.cwd {
        options = options.with_cwd(cwd);
    }
    if let Some(ms) = request.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    for (key, value) in &request.env {
        options = options.with_env(key, value);
    }

    match request.parser {
        ParserKind::List => execute(executor, &request, &options, ListParser).await,
        ParserKind::Scalar => execute(executor, &request, &options, ScalarParser).await,
        ParserKind::Table => execute(executor, &request, &options, TableParser).await,
        ParserKind::Inspect => {
            let parser = JsonEnvelopeParser::<ContainerDetails>::new();
            execute(executor, &request, &options, parser).await
        }
        ParserKind::Json => {
            let parser = JsonEnvelopeParser::<serde_json::Value>::new();
            execute(executor, &request, &options, parser).await
        }
        ParserKind::JsonArray => {
            let parser = JsonArrayParser::<serde_json::Value>::new();
            execute(executor, &request, &options, parser).await
        }
        ParserKind::KeyValue => execute(executor, &request, &options, KeyValueParser).await,
        ParserKind::Diff => execute(executor, &request, &options, DiffParser).await,
        ParserKind::Delimited => {
            if request.columns.is_empty() {
                anyhow::bail!("The delimited parser needs --columns");
            }
            let parser = DelimitedParser::new(request.columns.iter().cloned());
            execute(executor, &request, &options, parser).await
        }
        ParserKind::Ps => execute(executor, &request, &options, ContainerSummaryParser::new()).await,
        ParserKind::IgnoreError => execute(executor, &request, &options, IgnoreErrorParser).await,
        ParserKind::ExitCode => execute(executor, &request, &options, NoDataParser).await,
    }
}

async fn execute<P>(
    executor: &Executor,
    request: &RunRequest,
    options: &InvocationOptions,
    parser: P,
) -> Result<bool>
where
    P: ResponseParser,
    P::Output: Serialize + Render,
{
    let response = executor
        .run(&request.name, &request.args, options, &parser)
        .await
        .with_context(|| format!("Failed to run {}", request.name))?;

    match request.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text if response.success => println!("{}", response.data.render()),
        OutputFormat::Text => {
            for line in &response.log {
                eprintln!("{}", line);
            }
            eprintln!("Error: {}", response.error);
        }
    }

    Ok(response.success)
}
