//! Single-line records joined with `;`
//!
//! Produced by `--format` templates such as
//! `{{.ID}};{{.Image}};{{.Status}}`. The last column absorbs any extra
//! separators, so a free-text field belongs at the end of the template.

use crate::models::ContainerSummary;
use command_executor::{CommandResponse, ProcessExecutionResult, ResponseParser, Result};
use indexmap::IndexMap;

/// Field separator used by the format templates
pub const SEPARATOR: char = ';';

/// Maps `;`-joined fields onto a fixed list of column names
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    columns: Vec<String>,
}

impl DelimitedParser {
    /// Create a parser for the given column names, in template order
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Column names in template order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Split one line into trimmed fields
    ///
    /// Extra separators stay in the last field. A line with fewer fields than
    /// columns is rejected with a message naming both counts.
    pub fn split_line(&self, line: &str) -> std::result::Result<Vec<String>, String> {
        let fields: Vec<String> = line
            .splitn(self.columns.len().max(1), SEPARATOR)
            .map(|field| field.trim().to_string())
            .collect();

        if fields.len() < self.columns.len() {
            return Err(format!(
                "Expected {} fields, found {}",
                self.columns.len(),
                fields.len()
            ));
        }
        Ok(fields)
    }

    fn records(&self, result: &ProcessExecutionResult) -> std::result::Result<Vec<IndexMap<String, String>>, String> {
        result
            .stdout_lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let fields = self.split_line(line)?;
                Ok(self.columns.iter().cloned().zip(fields).collect())
            })
            .collect()
    }
}

impl ResponseParser for DelimitedParser {
    type Output = Vec<IndexMap<String, String>>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Self::Output>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }
        Ok(match self.records(result) {
            Ok(records) => CommandResponse::ok(result.log_lines(), records),
            Err(error) => CommandResponse::failed(result.log_lines(), error),
        })
    }
}

/// `ps --format` template matching [`ContainerSummaryParser`]
pub const CONTAINER_SUMMARY_FORMAT: &str =
    "{{.ID}};{{.Image}};{{.CreatedAt}};{{.Status}};{{.Ports}};{{.Names}};{{.Command}}";

const CONTAINER_SUMMARY_COLUMNS: [&str; 7] =
    ["ID", "Image", "CreatedAt", "Status", "Ports", "Names", "Command"];

/// Parses `ps --format` output produced with [`CONTAINER_SUMMARY_FORMAT`]
#[derive(Debug, Clone)]
pub struct ContainerSummaryParser {
    inner: DelimitedParser,
}

impl ContainerSummaryParser {
    /// Create the parser
    pub fn new() -> Self {
        Self {
            inner: DelimitedParser::new(CONTAINER_SUMMARY_COLUMNS),
        }
    }
}

impl Default for ContainerSummaryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser for ContainerSummaryParser {
    type Output = Vec<ContainerSummary>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Self::Output>> {
        Ok(self.inner.parse(result)?.map(|records| {
            records
                .into_iter()
                .map(|mut record| {
                    let mut take = |key: &str| record.swap_remove(key).unwrap_or_default();
                    ContainerSummary {
                        id: take("ID"),
                        image: take("Image"),
                        created: take("CreatedAt"),
                        status: take("Status"),
                        ports: take("Ports"),
                        names: take("Names")
                            .split(',')
                            .map(|name| name.trim().trim_start_matches('/').to_string())
                            .filter(|name| !name.is_empty())
                            .collect(),
                        command: take("Command"),
                    }
                })
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_follow_columns() {
        let parser = DelimitedParser::new(["Name", "Driver"]);
        let response = parser
            .parse(&ProcessExecutionResult::from_stdout("data;local\ncache ; local\n"))
            .unwrap();
        assert!(response.success);
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[1]["Name"], "cache");
        assert_eq!(response.data[1]["Driver"], "local");
    }

    #[test]
    fn test_extra_separators_fold_into_last_field() {
        let parser = DelimitedParser::new(["ID", "Command"]);
        let fields = parser.split_line("4f66;\"nginx -g 'daemon off;'\"").unwrap();
        assert_eq!(fields, vec!["4f66", "\"nginx -g 'daemon off;'\""]);
    }

    #[test]
    fn test_short_line_fails() {
        let parser = DelimitedParser::new(["ID", "Image", "Status"]);
        let response = parser
            .parse(&ProcessExecutionResult::from_stdout("4f66;nginx;Up\n9a01;redis\n"))
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.error, "Expected 3 fields, found 2");
        assert!(response.data.is_empty());
        assert_eq!(response.log.len(), 2);
    }

    #[test]
    fn test_no_output_is_empty_list() {
        let response = DelimitedParser::new(["ID"])
            .parse(&ProcessExecutionResult::from_stdout(""))
            .unwrap();
        assert!(response.success);
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_container_summary() {
        let stdout = "4f66ad9a0b2e;nginx:latest;2024-05-01 09:12:00 +0000 UTC;Up 2 hours;0.0.0.0:8080->80/tcp;/web,/frontend/web;\"/docker-entrypoint.sh nginx -g 'daemon off;'\"\n";
        let response = ContainerSummaryParser::new()
            .parse(&ProcessExecutionResult::from_stdout(stdout))
            .unwrap();
        assert!(response.success, "{}", response.error);

        let summary = &response.data[0];
        assert_eq!(summary.id, "4f66ad9a0b2e");
        assert_eq!(summary.status, "Up 2 hours");
        assert_eq!(summary.names, vec!["web", "frontend/web"]);
        assert_eq!(
            summary.command,
            "\"/docker-entrypoint.sh nginx -g 'daemon off;'\""
        );
    }
}
