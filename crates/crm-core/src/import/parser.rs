//! Best-effort CSV tokenizer.
//!
//! Input is split on newlines before fields are tokenized, so a quoted value
//! cannot span lines. Malformed quoting never fails: an unterminated quote
//! simply runs to the end of its line.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One data row keyed by header.
///
/// A row shorter than the header row has no entry for the trailing headers;
/// [`CsvRow::value`] resolves those to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsvRow {
    values: HashMap<String, String>,
}

impl CsvRow {
    /// The raw value under `header`, or `""` when the row has none.
    pub fn value(&self, header: &str) -> &str {
        self.values.get(header).map(String::as_str).unwrap_or("")
    }

    /// Whether the row carried a field for `header` at all.
    pub fn contains(&self, header: &str) -> bool {
        self.values.contains_key(header)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Headers plus data rows, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl ParsedCsv {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }
}

/// Parse CSV text into headers and rows. Never fails.
///
/// Blank lines are skipped; the first remaining line is the header row.
/// When a header repeats, the later column wins within each row.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return ParsedCsv::default();
    };
    let headers = split_fields(header_line);

    let rows = lines
        .map(|line| {
            let values = headers
                .iter()
                .cloned()
                .zip(split_fields(line))
                .collect::<HashMap<_, _>>();
            CsvRow { values }
        })
        .collect();

    ParsedCsv { headers, rows }
}

/// Split one line into trimmed, unquoted field values.
///
/// A comma inside double quotes is literal and `""` inside quotes is an
/// escaped quote character. Quote characters themselves are never emitted.
/// Every value is trimmed after unquoting, so whitespace a quoted value
/// starts or ends with is dropped too (`" Bell, Taylor "` reads back as
/// `Bell, Taylor`).
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quoted_comma_is_preserved() {
        let parsed = parse_csv("Name,Email\nAda Lovelace,ada@x.com\n\"Bell, Taylor\",bell@x.com");
        assert_eq!(parsed.headers, vec!["Name", "Email"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows[0].value("Name"), "Ada Lovelace");
        assert_eq!(parsed.rows[1].value("Name"), "Bell, Taylor");
        assert_eq!(parsed.rows[1].value("Email"), "bell@x.com");
    }

    #[test]
    fn test_quoted_padding_is_trimmed() {
        assert_eq!(
            split_fields(r#"" Bell, Taylor ",  x  "#),
            vec!["Bell, Taylor", "x"]
        );
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(
            split_fields(r#""She said ""hi""",x"#),
            vec![r#"She said "hi""#, "x"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_csv(""), ParsedCsv::default());
        assert_eq!(parse_csv("\n \n\n"), ParsedCsv::default());
    }

    #[test]
    fn test_header_only() {
        let parsed = parse_csv("Name,Email\n\n");
        assert_eq!(parsed.headers, vec!["Name", "Email"]);
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let parsed = parse_csv("Name,Email\r\n\r\nAda,ada@x.com\r\n   \r\nBell,bell@x.com\r\n");
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows[0].value("Email"), "ada@x.com");
        assert_eq!(parsed.rows[1].value("Name"), "Bell");
    }

    #[test]
    fn test_short_row_leaves_missing_keys() {
        let parsed = parse_csv("Name,Email,Phone\nAda,ada@x.com");
        let row = &parsed.rows[0];
        assert!(!row.contains("Phone"));
        assert_eq!(row.value("Phone"), "");
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let parsed = parse_csv("Name\nAda,ignored,also ignored");
        assert_eq!(parsed.rows[0].len(), 1);
        assert_eq!(parsed.rows[0].value("Name"), "Ada");
    }

    #[test]
    fn test_unterminated_quote_runs_to_end_of_line() {
        let parsed = parse_csv("Name,Email\n\"Ada, Countess,ada@x.com\nBell,bell@x.com");
        assert_eq!(parsed.rows[0].value("Name"), "Ada, Countess,ada@x.com");
        assert_eq!(parsed.rows[0].value("Email"), "");
        assert_eq!(parsed.rows[1].value("Name"), "Bell");
    }

    #[test]
    fn test_quoted_headers_are_unquoted() {
        let parsed = parse_csv("\"Full Name\", \"E-mail\"\nAda,ada@x.com");
        assert_eq!(parsed.headers, vec!["Full Name", "E-mail"]);
    }

    #[test]
    fn test_every_row_has_full_header_set() {
        let text = "a,b,c\n1,2,3\n4,5,6\n7,8,9\n";
        let parsed = parse_csv(text);
        assert_eq!(parsed.row_count(), 3);
        for row in &parsed.rows {
            for header in &parsed.headers {
                assert!(row.contains(header));
            }
        }
    }
}
