//! Command line front end for the execution layer
//!
//! Resolves a tool, runs it through one of the response parsers and prints the
//! result, or follows a long-running command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use command_executor::{Executor, ExecutorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{OutputFormat, ParserKind};

#[derive(Parser)]
#[command(name = "cli-probe")]
#[command(about = "Run container CLI tools and inspect their parsed output")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults are used if it does not exist)
    #[arg(short, long, global = true, default_value = "cli-probe.yaml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where tools resolve to
    Resolve {
        /// Logical tool names
        #[arg(required = true)]
        names: Vec<String>,

        /// Look in the alternate install location first
        #[arg(long)]
        prefer_alternate: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a tool to completion and parse its output
    Run {
        /// Logical tool name
        name: String,

        /// Argument string, split with shell-like quoting
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        args: String,

        /// How to interpret the output
        #[arg(short, long, value_enum, default_value = "list")]
        parser: ParserKind,

        /// Column names for the delimited parser, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Kill the process after this many milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Extra environment variables (KEY=VALUE)
        #[arg(short, long, value_parser = commands::run::parse_env)]
        env: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Follow the stdout of a long-running tool
    Stream {
        /// Logical tool name
        name: String,

        /// Argument string, split with shell-like quoting
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        args: String,

        /// Only print lines containing this text
        #[arg(long)]
        filter: Option<String>,

        /// Cancel the stream after this many seconds
        #[arg(short = 's', long)]
        for_secs: Option<u64>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ExecutorConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let executor = Executor::from_config(&config);

    let success = smol::block_on(async {
        match cli.command {
            Commands::Resolve {
                names,
                prefer_alternate,
                format,
            } => commands::resolve::run(&executor, &names, prefer_alternate, format),
            Commands::Run {
                name,
                args,
                parser,
                columns,
                timeout_ms,
                cwd,
                env,
                format,
            } => {
                let request = commands::run::RunRequest {
                    name,
                    args,
                    parser,
                    columns,
                    timeout_ms,
                    cwd,
                    env,
                    format,
                };
                commands::run::run(&executor, request).await
            }
            Commands::Stream {
                name,
                args,
                filter,
                for_secs,
            } => commands::stream::run(&executor, &name, &args, filter, for_secs).await,
        }
    })?;

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
