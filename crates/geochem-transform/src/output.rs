//! Delimited text output.
//!
//! Every command result becomes a [`TextTable`] before it is written. Files
//! are written to a hidden sibling and renamed into place, so a failed run
//! never leaves a partial table under the final name.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use geochem_model::{GeochemError, Result, format_numeric};

/// Header plus rows of already formatted cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(false).from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to `path` through a temporary sibling file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let temp = temp_sibling(path);
        let written = File::create(&temp)
            .and_then(|file| self.write_to(io::BufWriter::new(file)).map_err(io::Error::from))
            .and_then(|()| fs::rename(&temp, path));
        if let Err(source) = written {
            let _ = fs::remove_file(&temp);
            return Err(GeochemError::FileWrite {
                path: path.to_path_buf(),
                source,
            });
        }
        info!(path = %path.display(), rows = self.rows.len(), "wrote table");
        Ok(())
    }
}

/// Cell text for an optional number, trailing zeros removed.
pub fn number_cell(value: Option<f64>) -> String {
    value.map(format_numeric).unwrap_or_default()
}

/// Cell text for optional text.
pub fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
