//! Parsers that work on whole lines without interpreting them

use command_executor::{CommandResponse, ProcessExecutionResult, ResponseParser, Result};

/// Returns stdout lines unmodified; fails on a non-zero exit
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParser;

impl ResponseParser for ListParser {
    type Output = Vec<String>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Vec<String>>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        Ok(CommandResponse::ok(result.log_lines(), result.stdout_lines.clone()))
    }
}

/// Returns the first stdout line
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarParser;

impl ResponseParser for ScalarParser {
    type Output = String;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<String>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        Ok(match result.stdout_lines.first() {
            Some(line) => CommandResponse::ok(result.log_lines(), line.clone()),
            None => CommandResponse::failed(result.log_lines(), "No line"),
        })
    }
}

/// Reports success whatever happened; the payload is the exit code
///
/// For commands whose failure is expected and harmless, such as removing
/// something that may already be gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreErrorParser;

impl ResponseParser for IgnoreErrorParser {
    type Output = i32;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<i32>> {
        Ok(CommandResponse::ok(result.log_lines(), result.exit_code))
    }
}

/// Succeeds iff the process exited with code 0; carries no payload
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDataParser;

impl ResponseParser for NoDataParser {
    type Output = ();

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<()>> {
        Ok(CommandResponse::gate(result).unwrap_or_else(|| CommandResponse::ok(result.log_lines(), ())))
    }
}
