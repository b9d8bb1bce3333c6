//! Splitting a composed argument string into argv

use crate::error::{Error, Result};

/// Split an argument string into words using shell-like rules
///
/// Whitespace separates words. Single quotes group literally, double quotes group
/// with backslash escapes, and a backslash outside quotes escapes the next
/// character. Quotes are removed from the resulting words. Nothing is expanded.
pub fn split_arguments(input: &str) -> Result<Vec<String>> {
    shell_words::split(input).map_err(|e| Error::Config(format!("{e}: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(
            split_arguments("  ps -a   --no-trunc ").unwrap(),
            vec!["ps", "-a", "--no-trunc"]
        );
        assert!(split_arguments("").unwrap().is_empty());
    }

    #[test]
    fn test_format_template() {
        let args = split_arguments(r#"ps --format "{{.ID}};{{.Image}};{{.Names}}""#).unwrap();
        assert_eq!(args, vec!["ps", "--format", "{{.ID}};{{.Image}};{{.Names}}"]);
    }

    #[test]
    fn test_quotes_and_escapes() {
        assert_eq!(
            split_arguments(r#"-c 'echo "a b"' x\ y "q\"uote" """#).unwrap(),
            vec!["-c", r#"echo "a b""#, "x y", "q\"uote", ""]
        );
        assert_eq!(split_arguments(r#""C:\Program Files\x""#).unwrap(), vec![r"C:\Program Files\x"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(matches!(split_arguments("run 'oops"), Err(Error::Config(_))));
        assert!(matches!(split_arguments("run \"oops"), Err(Error::Config(_))));
        assert!(matches!(split_arguments("run oops\\"), Err(Error::Config(_))));
    }
}
