//! Filesystem change listings (`docker diff`, `podman diff`)

use command_executor::{CommandResponse, Error, ProcessExecutionResult, ResponseParser, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change reported for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// `A`: the path was added
    Added,
    /// `C`: the path was changed
    Updated,
    /// `D`: the path was deleted
    Removed,
    /// `N`: the path was newly created by the runtime
    Created,
}

impl DiffKind {
    /// Map a single-letter change code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Self::Added),
            "C" => Some(Self::Updated),
            "D" => Some(Self::Removed),
            "N" => Some(Self::Created),
            _ => None,
        }
    }

    /// The single-letter change code
    pub fn code(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Updated => 'C',
            Self::Removed => 'D',
            Self::Created => 'N',
        }
    }
}

/// One changed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// What happened to the path
    pub kind: DiffKind,
    /// The path inside the container
    pub item: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.code(), self.item)
    }
}

/// Parses `<code> <path>` lines
///
/// An unknown change code is an [`Error::UnsupportedFormat`]: filing a path
/// under the wrong kind would silently corrupt the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffParser;

impl DiffParser {
    /// Parse one non-empty line
    pub fn parse_line(line: &str) -> Result<DiffEntry> {
        let (code, item) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::unsupported_format("diff", line))?;
        let kind = DiffKind::from_code(code).ok_or_else(|| Error::unsupported_format("diff", line))?;

        Ok(DiffEntry {
            kind,
            item: item.trim().to_string(),
        })
    }
}

impl ResponseParser for DiffParser {
    type Output = Vec<DiffEntry>;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<Vec<DiffEntry>>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }

        let entries = result
            .stdout_lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Self::parse_line(line))
            .collect::<Result<Vec<_>>>()?;
        Ok(CommandResponse::ok(result.log_lines(), entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_entry() {
        assert_eq!(
            DiffParser::parse_line("A /etc/foo").unwrap(),
            DiffEntry {
                kind: DiffKind::Added,
                item: "/etc/foo".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_code_is_unsupported() {
        assert!(matches!(
            DiffParser::parse_line("X /etc/bar"),
            Err(Error::UnsupportedFormat { parser: "diff", .. })
        ));
        assert!(matches!(
            DiffParser::parse_line("/etc/bar"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_parse_listing() {
        let stdout = "C /etc\nA /etc/app.conf\nD /tmp/old file\n\nN /run/secrets\n";
        let response = DiffParser.parse(&ProcessExecutionResult::from_stdout(stdout)).unwrap();

        assert!(response.success);
        let kinds: Vec<_> = response.data.iter().map(|entry| entry.kind).collect();
        assert_eq!(
            kinds,
            vec![DiffKind::Updated, DiffKind::Added, DiffKind::Removed, DiffKind::Created]
        );
        assert_eq!(response.data[2].item, "/tmp/old file");
        assert_eq!(response.data[1].to_string(), "A /etc/app.conf");
    }

    #[test]
    fn test_listing_with_unknown_code_fails_whole_parse() {
        let result = ProcessExecutionResult::from_stdout("A /etc/foo\nX /etc/bar\n");
        assert!(DiffParser.parse(&result).is_err());
    }

    #[test]
    fn test_failed_exit_is_not_parsed() {
        let result = ProcessExecutionResult::new("docker diff nope", "X garbage\n", "No such container\n", 1);
        let response = DiffParser.parse(&result).unwrap();
        assert!(!response.success);
        assert!(response.data.is_empty());
    }
}
