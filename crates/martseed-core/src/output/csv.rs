//! # Flat-File I/O
//!
//! Writes and reads the dimension CSV files. The header row and field order
//! are the de facto schema shared with the bulk loader, so both sides go
//! through this module. Quoting follows the usual CSV convention: a field is
//! quoted when it contains a comma, quote, or newline, and embedded quotes
//! are doubled. Values themselves never span lines.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MartSeedError, Result};

/// Streaming CSV writer for one dimension file.
///
/// The header is written on creation; generators append rows batch by batch
/// so the whole dimension never has to sit in memory.
pub struct DimensionWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    rows_written: usize,
}

impl DimensionWriter {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self> {
        let file = File::create(path).map_err(|e| MartSeedError::Output {
            message: format!("creating {}", path.display()),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        write_record(&mut writer, path, header.iter().map(|s| s.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    pub fn write_row<I>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        write_record(&mut self.writer, &self.path, fields)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and close the file.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|e| MartSeedError::Output {
            message: format!("flushing {}", self.path.display()),
            source: e,
        })?;
        Ok(self.rows_written)
    }
}

fn write_record<W: Write, I>(writer: &mut W, path: &Path, fields: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let line = fields
        .into_iter()
        .map(|f| csv_escape(&f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line).map_err(|e| MartSeedError::Output {
        message: format!("writing row to {}", path.display()),
        source: e,
    })
}

/// Read a dimension file back: returns the header and all data rows.
///
/// The loader validates the header against the expected field list so a
/// stale or foreign file fails loudly instead of loading garbage.
pub fn read_dimension_file(path: &Path, expected_header: &[&str]) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| MartSeedError::Output {
        message: format!("opening {}", path.display()),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => parse_line(
            &line.map_err(|e| MartSeedError::Output {
                message: format!("reading {}", path.display()),
                source: e,
            })?,
            path,
            1,
        )?,
        None => {
            return Err(MartSeedError::FlatFile {
                path: path.display().to_string(),
                line: 1,
                message: "file is empty, expected a header row".to_string(),
            })
        }
    };

    if header != expected_header {
        return Err(MartSeedError::FlatFile {
            path: path.display().to_string(),
            line: 1,
            message: format!(
                "unexpected header [{}], expected [{}]",
                header.join(","),
                expected_header.join(",")
            ),
        });
    }

    for (idx, line) in lines {
        let line = line.map_err(|e| MartSeedError::Output {
            message: format!("reading {}", path.display()),
            source: e,
        })?;
        if line.is_empty() {
            continue;
        }
        let fields = parse_line(&line, path, idx + 1)?;
        if fields.len() != expected_header.len() {
            return Err(MartSeedError::FlatFile {
                path: path.display().to_string(),
                line: idx + 1,
                message: format!(
                    "expected {} fields, found {}",
                    expected_header.len(),
                    fields.len()
                ),
            });
        }
        rows.push(fields);
    }

    Ok(rows)
}

/// Escape a string for CSV: quote if it contains comma, quote, or newline.
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse one CSV line into fields, honoring quotes and doubled quotes.
fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut field));
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(MartSeedError::FlatFile {
            path: path.display().to_string(),
            line: line_no,
            message: "unterminated quoted field".to_string(),
        });
    }

    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("hello,world"), "\"hello,world\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_parse_line_plain() {
        let fields = parse_line("a,b,c", Path::new("t.csv"), 1).unwrap();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_line_quoted() {
        let fields = parse_line("\"a,b\",\"say \"\"hi\"\"\",c", Path::new("t.csv"), 1).unwrap();
        assert_eq!(fields, vec!["a,b", "say \"hi\"", "c"]);
    }

    #[test]
    fn test_parse_line_unterminated_quote() {
        let err = parse_line("\"oops,b", Path::new("t.csv"), 3).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("things.csv");

        let mut writer = DimensionWriter::create(&path, &["name", "note"]).unwrap();
        writer
            .write_row(vec!["plain".to_string(), "with,comma".to_string()])
            .unwrap();
        writer
            .write_row(vec!["quoted \"x\"".to_string(), "ok".to_string()])
            .unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let rows = read_dimension_file(&path, &["name", "note"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["plain", "with,comma"]);
        assert_eq!(rows[1], vec!["quoted \"x\"", "ok"]);
    }

    #[test]
    fn test_read_rejects_wrong_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("things.csv");
        let mut writer = DimensionWriter::create(&path, &["a", "b"]).unwrap();
        writer.finish().unwrap();

        let err = read_dimension_file(&path, &["a", "c"]).unwrap_err();
        assert!(err.to_string().contains("unexpected header"));
    }

    #[test]
    fn test_read_rejects_short_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("things.csv");
        std::fs::write(&path, "a,b\n1\n").unwrap();

        let err = read_dimension_file(&path, &["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("expected 2 fields"));
    }
}
