//! Whitespace-aligned text tables (`docker top`, `podman top`)
//!
//! There is no delimiter in these listings. Column boundaries come from the
//! header row: every run of non-space characters starts a column, and each data
//! row is sliced at those character positions. The last column takes the rest
//! of the row, so commands with spaces survive intact.

use crate::duration::parse_duration;
use command_executor::{CommandResponse, ProcessExecutionResult, ResponseParser, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Tool-agnostic process listing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessColumn {
    /// Owning user (`UID`, `USER`)
    User,
    /// Process id
    Pid,
    /// Parent process id
    ParentPid,
    /// CPU utilisation (`C`, `%CPU`, `CPU`)
    CpuPercent,
    /// Memory utilisation
    MemPercent,
    /// Start time as printed (`STIME`, `START`)
    StartTime,
    /// Controlling terminal
    Tty,
    /// Accumulated CPU time
    CpuTime,
    /// Wall-clock time since start
    Elapsed,
    /// Command line, or image name on Windows (`CMD`, `COMMAND`, `Name`)
    Command,
    /// Virtual memory size
    Vsz,
    /// Resident set size
    Rss,
    /// Process state (`STAT`, `S`)
    State,
    /// Windows private working set
    WorkingSet,
}

/// Header spellings seen across tools and platforms, matched case-insensitively
const COLUMN_SYNONYMS: &[(&str, ProcessColumn)] = &[
    ("UID", ProcessColumn::User),
    ("USER", ProcessColumn::User),
    ("PID", ProcessColumn::Pid),
    ("PPID", ProcessColumn::ParentPid),
    ("C", ProcessColumn::CpuPercent),
    ("%CPU", ProcessColumn::CpuPercent),
    ("CPU", ProcessColumn::CpuPercent),
    ("%MEM", ProcessColumn::MemPercent),
    ("STIME", ProcessColumn::StartTime),
    ("START", ProcessColumn::StartTime),
    ("TTY", ProcessColumn::Tty),
    ("TT", ProcessColumn::Tty),
    ("TIME", ProcessColumn::CpuTime),
    ("ELAPSED", ProcessColumn::Elapsed),
    ("CMD", ProcessColumn::Command),
    ("COMMAND", ProcessColumn::Command),
    ("NAME", ProcessColumn::Command),
    ("VSZ", ProcessColumn::Vsz),
    ("RSS", ProcessColumn::Rss),
    ("STAT", ProcessColumn::State),
    ("S", ProcessColumn::State),
    ("PRIVATE WORKING SET", ProcessColumn::WorkingSet),
];

impl ProcessColumn {
    /// Map a header title to its canonical column
    pub fn from_title(title: &str) -> Option<Self> {
        COLUMN_SYNONYMS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(title))
            .map(|(_, column)| *column)
    }

    fn coerce(self, raw: &str) -> FieldValue {
        let parsed = match self {
            Self::Pid | Self::ParentPid | Self::Vsz | Self::Rss => {
                raw.parse().ok().map(FieldValue::Integer)
            }
            Self::CpuPercent | Self::MemPercent => raw.parse().ok().map(FieldValue::Float),
            Self::CpuTime | Self::Elapsed => parse_duration(raw).map(FieldValue::Duration),
            _ => None,
        };
        parsed.unwrap_or_else(|| FieldValue::Text(raw.to_string()))
    }
}

/// A cell value after per-column coercion
///
/// Values that do not parse as their column's type are kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Whole number (ids, sizes)
    Integer(i64),
    /// Percentage
    Float(f64),
    /// Time span
    Duration(Duration),
    /// Anything else, verbatim
    Text(String),
}

impl FieldValue {
    /// The value if it is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The value if it is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The value if it is a duration
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(value) => Some(*value),
            _ => None,
        }
    }

    /// The value if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// One data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    /// Values of the recognised columns, in header order
    pub fields: IndexMap<ProcessColumn, FieldValue>,
    /// Every trimmed cell, including those of unrecognised columns
    pub tokens: Vec<String>,
}

impl ProcessRow {
    /// Value of a canonical column
    pub fn get(&self, column: ProcessColumn) -> Option<&FieldValue> {
        self.fields.get(&column)
    }

    /// The process id
    pub fn pid(&self) -> Option<i64> {
        self.get(ProcessColumn::Pid)?.as_integer()
    }

    /// The command column as text
    pub fn command(&self) -> Option<&str> {
        self.get(ProcessColumn::Command)?.as_text()
    }
}

/// A parsed process listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessTable {
    /// Header titles as printed
    pub titles: Vec<String>,
    /// Canonical column per title, `None` where the title is not recognised
    pub columns: Vec<Option<ProcessColumn>>,
    /// Data rows
    pub rows: Vec<ProcessRow>,
}

impl ProcessTable {
    /// Parse a header line and its data rows
    pub fn from_lines<S: AsRef<str>>(header: &str, rows: &[S]) -> Self {
        let (boundaries, quirks) = apply_header_quirks(header, column_boundaries(header));
        let titles = slice_row(header, &boundaries);
        let columns: Vec<_> = titles
            .iter()
            .map(|title| {
                quirks
                    .iter()
                    .find_map(|quirk| quirk.column_for(title))
                    .or_else(|| ProcessColumn::from_title(title))
            })
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                let tokens = slice_row(row.as_ref(), &boundaries);
                let fields = columns
                    .iter()
                    .zip(&tokens)
                    .filter_map(|(column, token)| column.map(|c| (c, c.coerce(token))))
                    .collect();
                ProcessRow { fields, tokens }
            })
            .collect();

        Self {
            titles,
            columns,
            rows,
        }
    }
}

impl fmt::Display for ProcessTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.titles.iter().map(|t| t.chars().count()).collect();
        for row in &self.rows {
            for (i, token) in row.tokens.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(token.chars().count());
                }
            }
        }

        let write_line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let last = cells.len().saturating_sub(1);
            for (i, cell) in cells.iter().enumerate() {
                if i == last {
                    writeln!(f, "{cell}")?;
                } else {
                    let width = widths.get(i).copied().unwrap_or(0);
                    write!(f, "{cell:<width$}  ")?;
                }
            }
            Ok(())
        };

        write_line(f, &self.titles)?;
        for row in &self.rows {
            write_line(f, &row.tokens)?;
        }
        Ok(())
    }
}

/// Character index at which each column starts
///
/// Every maximal run of non-space characters in the header starts a column. The
/// first column always starts at 0 so leading padding is not lost.
pub fn column_boundaries(header: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut previous_blank = true;

    for (index, c) in header.chars().enumerate() {
        let blank = c.is_whitespace();
        if previous_blank && !blank {
            boundaries.push(index);
        }
        previous_blank = blank;
    }

    if let Some(first) = boundaries.first_mut() {
        *first = 0;
    }
    boundaries
}

/// Slice a row at the given boundaries and trim each cell
///
/// The final cell takes the remainder of the row; cells past the end of a short
/// row are empty.
pub fn slice_row(row: &str, boundaries: &[usize]) -> Vec<String> {
    let chars: Vec<char> = row.chars().collect();

    boundaries
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = boundaries.get(i + 1).copied().unwrap_or(chars.len()).min(chars.len());
            if start >= end {
                return String::new();
            }
            chars[start..end].iter().collect::<String>().trim().to_string()
        })
        .collect()
}

/// A multi-word header title the generic scanner splits apart
#[derive(Debug, Clone, Copy)]
pub struct HeaderQuirk {
    /// Name used in logs
    pub name: &'static str,
    /// The title as it appears in the header
    pub marker: &'static str,
    /// Number of columns the dialect really has
    pub expected_columns: usize,
    /// Titles that mean something else in this dialect
    pub column_overrides: &'static [(&'static str, ProcessColumn)],
}

impl HeaderQuirk {
    /// Whether the scanner output for `header` shows this dialect
    ///
    /// The header must contain the marker and the scanner must have produced
    /// exactly one extra boundary per extra word in the marker (one for a
    /// two-word title).
    pub fn applies(&self, header: &str, boundary_count: usize) -> bool {
        let extra_words = self.marker.split_whitespace().count().saturating_sub(1);
        extra_words > 0
            && boundary_count == self.expected_columns + extra_words
            && header.contains(self.marker)
    }

    fn column_for(&self, title: &str) -> Option<ProcessColumn> {
        self.column_overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(title))
            .map(|(_, column)| *column)
    }
}

/// Windows containers: `Name  PID  CPU  Private Working Set`
///
/// `CPU` holds accumulated CPU time (`00:00:00.062`) in this dialect.
pub const PRIVATE_WORKING_SET: HeaderQuirk = HeaderQuirk {
    name: "private-working-set",
    marker: "Private Working Set",
    expected_columns: 4,
    column_overrides: &[("CPU", ProcessColumn::CpuTime)],
};

const HEADER_QUIRKS: &[HeaderQuirk] = &[PRIVATE_WORKING_SET];

/// Collapse every matching quirk and return the quirks that fired
fn apply_header_quirks(
    header: &str,
    mut boundaries: Vec<usize>,
) -> (Vec<usize>, Vec<&'static HeaderQuirk>) {
    let mut applied = Vec::new();
    for quirk in HEADER_QUIRKS {
        if quirk.applies(header, boundaries.len()) {
            boundaries = collapse_marker(header, boundaries, quirk);
            applied.push(quirk);
        }
    }
    (boundaries, applied)
}

/// Merge the columns the scanner found inside `quirk.marker`
///
/// Anything the quirk does not [apply](HeaderQuirk::applies) to is left alone.
pub fn collapse_marker(header: &str, boundaries: Vec<usize>, quirk: &HeaderQuirk) -> Vec<usize> {
    if !quirk.applies(header, boundaries.len()) {
        return boundaries;
    }
    let Some(byte_start) = header.find(quirk.marker) else {
        return boundaries;
    };

    let start = header[..byte_start].chars().count();
    let end = start + quirk.marker.chars().count();
    debug!("Applying header quirk {}", quirk.name);

    boundaries
        .into_iter()
        .filter(|&b| b <= start || b >= end)
        .collect()
}

/// Parses a process listing into a [`ProcessTable`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TableParser;

impl ResponseParser for TableParser {
    type Output = ProcessTable;

    fn parse(&self, result: &ProcessExecutionResult) -> Result<CommandResponse<ProcessTable>> {
        if let Some(failed) = CommandResponse::gate(result) {
            return Ok(failed);
        }

        let mut lines = result.stdout_lines.iter().filter(|line| !line.trim().is_empty());
        let Some(header) = lines.next() else {
            return Ok(CommandResponse::failed(result.log_lines(), "Empty response"));
        };
        let rows: Vec<&String> = lines.collect();

        let table = ProcessTable::from_lines(header, &rows);
        if table.columns.iter().all(Option::is_none) {
            return Ok(CommandResponse::failed(
                result.log_lines(),
                format!("Unrecognized table header: {}", header.trim()),
            ));
        }

        Ok(CommandResponse::ok(result.log_lines(), table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay cells out the way tabwriter-based tools do
    fn render(rows: &[Vec<&str>]) -> Vec<String> {
        let columns = rows[0].len();
        let widths: Vec<usize> = (0..columns)
            .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0) + 3)
            .collect();

        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        if c + 1 == columns {
                            cell.to_string()
                        } else {
                            format!("{cell:<width$}", width = widths[c])
                        }
                    })
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_slicing_reproduces_cells() {
        let tables: Vec<Vec<Vec<&str>>> = vec![
            vec![
                vec!["UID", "PID", "PPID", "C", "STIME", "TTY", "TIME", "CMD"],
                vec!["root", "2841", "2821", "0", "09:12", "?", "00:00:01", "nginx: master process nginx -g daemon off;"],
                vec!["systemd+", "2902", "2841", "0", "09:12", "?", "00:00:00", "nginx: worker process"],
            ],
            vec![
                vec!["USER", "PID", "PPID", "%CPU", "ELAPSED", "TTY", "TIME", "COMMAND"],
                vec!["postgres", "1", "0", "0.000", "1h2m3s", "?", "0s", "postgres"],
                vec!["postgres", "57", "1", "12.5", "4m0s", "pts/0", "1m2s", "postgres: checkpointer"],
            ],
            vec![
                vec!["USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND"],
                vec!["root", "1", "0.0", "0.1", "4624", "3712", "?", "Ss", "09:12", "0:00", "/bin/sh -c sleep infinity"],
            ],
        ];

        for cells in tables {
            let lines = render(&cells);
            let boundaries = column_boundaries(&lines[0]);
            for (line, expected) in lines.iter().zip(&cells) {
                assert_eq!(&slice_row(line, &boundaries), expected, "{line}");
            }
        }
    }

    #[test]
    fn test_linux_top_output() {
        let stdout = "\
UID                 PID                 PPID                C                   STIME               TTY                 TIME                CMD
root                2841                2821                0                   09:12               ?                   00:00:01            nginx: master process nginx -g daemon off;
101                 2902                2841                0                   09:12               ?                   12:34:56            nginx: worker process
";
        let response = TableParser.parse(&ProcessExecutionResult::from_stdout(stdout)).unwrap();
        assert!(response.success);

        let table = response.data;
        assert_eq!(table.titles.len(), 8);
        assert_eq!(table.rows.len(), 2);

        let master = &table.rows[0];
        assert_eq!(master.pid(), Some(2841));
        assert_eq!(master.get(ProcessColumn::ParentPid), Some(&FieldValue::Integer(2821)));
        assert_eq!(master.get(ProcessColumn::CpuPercent), Some(&FieldValue::Float(0.0)));
        assert_eq!(master.get(ProcessColumn::User), Some(&FieldValue::Text("root".to_string())));
        assert_eq!(master.command(), Some("nginx: master process nginx -g daemon off;"));
        assert_eq!(
            master.get(ProcessColumn::CpuTime).and_then(FieldValue::as_duration),
            Some(Duration::from_secs(1))
        );

        let worker = &table.rows[1];
        assert_eq!(
            worker.get(ProcessColumn::CpuTime).and_then(FieldValue::as_duration),
            Some(Duration::from_secs(12 * 3600 + 34 * 60 + 56))
        );
    }

    #[test]
    fn test_synonyms_map_to_same_columns() {
        let docker = ProcessTable::from_lines("UID   PID   STIME   CMD", &["root  1     09:12   sh"]);
        let podman = ProcessTable::from_lines("USER  PID   START   COMMAND", &["root  1     09:12   sh"]);
        assert_eq!(docker.columns, podman.columns);
        assert_eq!(docker.rows[0].fields, podman.rows[0].fields);
    }

    #[test]
    fn test_unmapped_header_kept_positionally() {
        let table = ProcessTable::from_lines("PID   LABEL   CMD", &["7     web     nginx"]);
        assert_eq!(table.columns, vec![Some(ProcessColumn::Pid), None, Some(ProcessColumn::Command)]);
        assert_eq!(table.rows[0].tokens, vec!["7", "web", "nginx"]);
        assert_eq!(table.rows[0].fields.len(), 2);
    }

    #[test]
    fn test_uncoercible_value_stays_text() {
        let table = ProcessTable::from_lines("PID   TIME     CMD", &["-     1-02:03  sh"]);
        let row = &table.rows[0];
        assert_eq!(row.get(ProcessColumn::Pid), Some(&FieldValue::Text("-".to_string())));
        assert_eq!(row.get(ProcessColumn::CpuTime), Some(&FieldValue::Text("1-02:03".to_string())));
    }

    #[test]
    fn test_overflowing_time_stays_text() {
        let table = ProcessTable::from_lines(
            "PID   TIME                        CMD",
            &["1     9999999999999999999:00:00   sh"],
        );
        assert_eq!(
            table.rows[0].get(ProcessColumn::CpuTime),
            Some(&FieldValue::Text("9999999999999999999:00:00".to_string()))
        );
    }

    #[test]
    fn test_short_row_yields_empty_cells() {
        let table = ProcessTable::from_lines("UID   PID   CMD", &["root  1"]);
        assert_eq!(table.rows[0].tokens, vec!["root", "1", ""]);
    }

    #[test]
    fn test_working_set_quirk_collapses_title() {
        let header = "Name                PID                 CPU                 Private Working Set";
        let generic = column_boundaries(header);
        assert_eq!(generic.len(), 6);

        let collapsed = collapse_marker(header, generic, &PRIVATE_WORKING_SET);
        assert_eq!(collapsed.len(), 4);

        let rows = ["smss.exe            1620                00:00:00.062        270.3kB"];
        let table = ProcessTable::from_lines(header, &rows);
        assert_eq!(table.titles, vec!["Name", "PID", "CPU", "Private Working Set"]);
        assert_eq!(table.columns[3], Some(ProcessColumn::WorkingSet));

        let row = &table.rows[0];
        assert_eq!(row.command(), Some("smss.exe"));
        assert_eq!(row.pid(), Some(1620));
        assert_eq!(table.columns[2], Some(ProcessColumn::CpuTime));
        assert_eq!(
            row.get(ProcessColumn::CpuTime).and_then(FieldValue::as_duration),
            Some(Duration::from_millis(62))
        );
        assert_eq!(
            row.get(ProcessColumn::WorkingSet),
            Some(&FieldValue::Text("270.3kB".to_string()))
        );
    }

    #[test]
    fn test_quirk_needs_both_marker_and_count() {
        let without_marker = "A   B   C   D   E   F";
        let boundaries = column_boundaries(without_marker);
        assert_eq!(
            collapse_marker(without_marker, boundaries.clone(), &PRIVATE_WORKING_SET),
            boundaries
        );

        let wrong_count = "Name   PID   Private Working Set";
        let boundaries = column_boundaries(wrong_count);
        assert_eq!(
            collapse_marker(wrong_count, boundaries.clone(), &PRIVATE_WORKING_SET),
            boundaries
        );
    }

    #[test]
    fn test_cpu_stays_percentage_outside_windows_dialect() {
        let table = ProcessTable::from_lines("PID   CPU   CMD", &["1     2.5   sh"]);
        assert_eq!(table.columns[1], Some(ProcessColumn::CpuPercent));
        assert_eq!(table.rows[0].get(ProcessColumn::CpuPercent), Some(&FieldValue::Float(2.5)));
    }

    #[test]
    fn test_display_tolerates_extra_tokens() {
        let table = ProcessTable {
            titles: vec!["PID".to_string()],
            columns: vec![Some(ProcessColumn::Pid)],
            rows: vec![ProcessRow {
                fields: IndexMap::new(),
                tokens: vec!["1".to_string(), "extra".to_string(), "sh".to_string()],
            }],
        };
        assert_eq!(table.to_string(), "PID\n1    extra  sh\n");
    }

    #[test]
    fn test_empty_response() {
        let response = TableParser.parse(&ProcessExecutionResult::from_stdout("\n")).unwrap();
        assert!(!response.success);
        assert_eq!(response.error, "Empty response");
        assert_eq!(response.data, ProcessTable::default());
    }

    #[test]
    fn test_unrecognized_header() {
        let response = TableParser
            .parse(&ProcessExecutionResult::from_stdout("Error response from daemon\n"))
            .unwrap();
        assert!(!response.success);
        assert!(response.error.starts_with("Unrecognized table header"));
    }

    #[test]
    fn test_display_replays_tokens() {
        let table = ProcessTable::from_lines("PID   CMD", &["1     sleep infinity", "42    sh"]);
        assert_eq!(table.to_string(), "PID  CMD\n1    sleep infinity\n42   sh\n");
    }
}
