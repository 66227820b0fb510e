//! Delimited-text reader for directory exports.
//!
//! The whole file is read into memory, checked for quoting errors, and then
//! split into records with the `csv` crate. The first record is the header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::errors::ReadError;

/// A parsed export: the header labels followed by the data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column labels from the first row, in file order.
    pub headers: Vec<String>,
    /// Data rows in file order. Rows may be shorter or longer than the header.
    pub rows: Vec<Vec<String>>,
}

/// CSV reader with a configurable delimiter.
#[derive(Debug, Clone)]
pub struct TabularReader {
    delimiter: u8,
}

impl Default for TabularReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TabularReader {
    /// Create a reader for comma-separated input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Open and parse the file at `path`.
    ///
    /// The file handle is dropped before this returns, on success and on
    /// every error path. Failing to open or read the file is
    /// [`ReadError::NotFound`].
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Table, ReadError> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading directory export");

        let unreadable = |source: std::io::Error| ReadError::NotFound {
            path: path.display().to_string(),
            source,
        };

        let mut raw = Vec::new();
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut raw))
            .map_err(unreadable)?;

        self.parse_bytes(raw)
    }

    /// Parse delimited text from any reader.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<Table, ReadError> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|source| ReadError::NotFound {
                path: "<reader>".into(),
                source,
            })?;

        self.parse_bytes(raw)
    }

    fn parse_bytes(&self, raw: Vec<u8>) -> Result<Table, ReadError> {
        let content = String::from_utf8(raw).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            ReadError::Format {
                line: line_of(valid),
                detail: "input is not valid UTF-8".into(),
            }
        })?;

        self.parse_str(&content)
    }

    /// Parse delimited text held in memory.
    ///
    /// A carriage return before a newline is dropped everywhere, including
    /// inside quoted fields, so CRLF exports yield `\n`-separated values.
    pub fn parse_str(&self, content: &str) -> Result<Table, ReadError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let normalized;
        let content = if content.contains("\r\n") {
            normalized = content.replace("\r\n", "\n");
            normalized.as_str()
        } else {
            content
        };
        check_quoting(content, self.delimiter)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let headers = match records.next() {
            Some(result) => into_fields(result?),
            None => return Err(ReadError::EmptyInput),
        };

        let mut rows = Vec::new();
        for result in records {
            rows.push(into_fields(result?));
        }

        debug!(columns = headers.len(), rows = rows.len(), "parsed directory export");
        Ok(Table { headers, rows })
    }
}

impl From<csv::Error> for ReadError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ReadError::Format {
            line,
            detail: err.to_string(),
        }
    }
}

fn into_fields(record: StringRecord) -> Vec<String> {
    record.iter().map(str::to_owned).collect()
}

fn line_of(prefix: &[u8]) -> u64 {
    prefix.iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

/// Reject quoting the `csv` crate would otherwise accept silently: a quote
/// inside an unquoted field, stray characters after a closing quote, and a
/// quoted field still open at end of input.
fn check_quoting(content: &str, delimiter: u8) -> Result<(), ReadError> {
    let bytes = content.as_bytes();
    let mut line: u64 = 1;
    let mut quote_line: u64 = 1;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            match b {
                b'"' if bytes.get(i + 1) == Some(&b'"') => i += 1,
                b'"' => {
                    in_quotes = false;
                    field_start = false;
                    match bytes.get(i + 1) {
                        None | Some(b'\r') | Some(b'\n') => {}
                        Some(&next) if next == delimiter => {}
                        Some(_) => {
                            return Err(ReadError::Format {
                                line,
                                detail: "extraneous or missing \" in quoted field".into(),
                            })
                        }
                    }
                }
                b'\n' => line += 1,
                _ => {}
            }
        } else {
            match b {
                _ if b == delimiter => field_start = true,
                b'"' if field_start => {
                    in_quotes = true;
                    quote_line = line;
                }
                b'"' => {
                    return Err(ReadError::Format {
                        line,
                        detail: "bare \" in non-quoted field".into(),
                    })
                }
                b'\n' => {
                    line += 1;
                    field_start = true;
                }
                b'\r' => field_start = true,
                _ => field_start = false,
            }
        }
        i += 1;
    }

    if in_quotes {
        return Err(ReadError::Format {
            line: quote_line,
            detail: "quoted field is never closed".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_and_rows() {
        let table = TabularReader::new()
            .parse_str("login,firstName,lastName\njdoe,Jane,Doe\nbob,Bob,Smith\n")
            .unwrap();
        assert_eq!(table.headers, vec!["login", "firstName", "lastName"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["bob", "Bob", "Smith"]);
    }

    #[test]
    fn test_quoted_fields() {
        let input = "login,title\nalice,\"Director, \"\"Platform\"\"\"\ncarol,\"Line one\nline two\"\n";
        let table = TabularReader::new().parse_str(input).unwrap();
        assert_eq!(table.rows[0][1], "Director, \"Platform\"");
        assert_eq!(table.rows[1][1], "Line one\nline two");
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let table = TabularReader::new()
            .parse_str("login,firstName,lastName\njdoe\nbob,Bob,Smith,extra\n")
            .unwrap();
        assert_eq!(table.rows[0], vec!["jdoe"]);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_header_only() {
        let table = TabularReader::new().parse_str("login,email\n").unwrap();
        assert_eq!(table.headers, vec!["login", "email"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let table = TabularReader::new()
            .parse_str("login,email\r\njdoe,jdoe@example.com\r\n")
            .unwrap();
        assert_eq!(table.rows[0], vec!["jdoe", "jdoe@example.com"]);
    }

    #[test]
    fn test_crlf_inside_quoted_field() {
        let table = TabularReader::new()
            .parse_str("login,title\r\njdoe,\"Line one\r\nline two\"\r\n")
            .unwrap();
        assert_eq!(table.rows[0][1], "Line one\nline two");
    }

    #[test]
    fn test_strips_byte_order_mark() {
        let table = TabularReader::new()
            .parse_str("\u{feff}login,email\njdoe,j@example.com\n")
            .unwrap();
        assert_eq!(table.headers[0], "login");
    }

    #[test]
    fn test_custom_delimiter() {
        let table = TabularReader::new()
            .with_delimiter(b';')
            .parse_str("login;department\njdoe;R&D, Tools\n")
            .unwrap();
        assert_eq!(table.rows[0], vec!["jdoe", "R&D, Tools"]);
    }

    #[test]
    fn test_empty_input() {
        let result = TabularReader::new().parse_str("");
        assert!(matches!(result, Err(ReadError::EmptyInput)));
    }

    #[test]
    fn test_unterminated_quote() {
        let result = TabularReader::new().parse_str("login,title\njdoe,\"Engineer\n");
        assert!(matches!(result, Err(ReadError::Format { line: 2, .. })));
    }

    #[test]
    fn test_bare_quote_in_field() {
        let result = TabularReader::new().parse_str("login,title\njdoe,Eng\"ineer\n");
        assert!(matches!(result, Err(ReadError::Format { line: 2, .. })));
    }

    #[test]
    fn test_text_after_closing_quote() {
        let result = TabularReader::new().parse_str("login,title\n\"jdoe\"x,Engineer\n");
        assert!(matches!(result, Err(ReadError::Format { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes: &[u8] = b"login,title\njdoe,\xff\xfe\n";
        let result = TabularReader::new().read_from(bytes);
        assert!(matches!(result, Err(ReadError::Format { line: 2, .. })));
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "login\njdoe\n").unwrap();

        let table = TabularReader::new().read_path(&path).unwrap();
        assert_eq!(table.rows, vec![vec!["jdoe".to_string()]]);
    }

    #[test]
    fn test_read_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = TabularReader::new().read_path(dir.path());
        assert!(matches!(result, Err(ReadError::NotFound { .. })));
    }

    #[test]
    fn test_read_missing_path() {
        let result = TabularReader::new().read_path("/nonexistent/users.csv");
        assert!(matches!(result, Err(ReadError::NotFound { .. })));
    }
}
