//! Environment export scripts (`export NAME="VALUE"` / `SET NAME=VALUE`)

use command_executor::{CommandResponse, ProcessExecutionResult, ResponseParser, Result};
use indexmap::IndexMap;

/// Parses the shell snippet tools print for `eval $(tool env ...)`
///
/// POSIX shells get `export NAME="VALUE"`, cmd.exe gets `SET NAME=VALUE`. Quotes
/// are stripped only from the `export` form. Comments and any other lines are
/// skipped. Later assignments to the same name win.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueParser;

impl KeyValueParser {
    /// Parse one line, returning `None` if it is not an assignment
    pub fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.trim();

        if let Some(rest) = strip_keyword(line, "export") {
            let (name, value) = rest.split_once('=')?;
            return assignment(name, strip_quotes(value.trim()));
        }
        if let Some(rest) = strip_keyword(line, "SET") {
            let (name, value) = rest.split_once('=')?;
            return assignment(name, value.trim());
        }
        None
    }
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

fn strip_quotes(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}

fn assignment(name: &str, value: &str) -> Option<(String, String)> {
    let name = name.trim();
    (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
}

impl ResponseParser for KeyValueParser {
    type Output = IndexMap<String, String>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Self::Output>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }

        let values = result
            .stdout_lines
            .iter()
            .filter_map(|line| Self::parse_line(line))
            .collect();
        Ok(CommandResponse::ok(result.log_lines(), values))
    }
}
