//! Minimal CSV writing.
//!
//! Comma-separated, UTF-8, header row; fields containing commas, quotes
//! or newlines are quoted with doubled inner quotes.

use crate::error::{CadenceError, Result};
use chrono::Utc;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Quote a field when it needs quoting.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV writer over a buffered file.
pub struct CsvWriter {
    writer: BufWriter<File>,
    rows: usize,
}

impl CsvWriter {
    /// Create the output file, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .map_err(|e| CadenceError::Report(format!("cannot create {}: {}", path.display(), e)))?;
        Ok(Self {
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Write one row, escaping every field.
    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = fields
            .iter()
            .map(|f| escape_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{}", line)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header included.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Timestamp-suffixed file name under the reports directory.
pub fn timestamped_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.csv", prefix, stamp))
}

/// Render an optional day count; absent metrics stay blank.
pub fn opt_days(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render an optional mean with two decimals.
pub fn opt_mean(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape_field("UP-1"), "UP-1");
        assert_eq!(escape_field("12"), "12");
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = CsvWriter::create(&path).unwrap();
        writer.write_row(&["key", "summary"]).unwrap();
        writer.write_row(&["UP-1", "hello, world"]).unwrap();
        assert_eq!(writer.rows(), 2);
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "key,summary\nUP-1,\"hello, world\"\n");
    }

    #[test]
    fn optional_renderers() {
        assert_eq!(opt_days(Some(3)), "3");
        assert_eq!(opt_days(None), "");
        assert_eq!(opt_mean(Some(2.5)), "2.50");
        assert_eq!(opt_mean(None), "");
    }

    #[test]
    fn timestamped_name_has_prefix_and_extension() {
        let path = timestamped_path(Path::new("reports"), "ttm_details");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ttm_details_"));
        assert!(name.ends_with(".csv"));
    }
}
