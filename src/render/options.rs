//! Conversion options configuration.

use crate::normalize::DateColumns;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension given to written tables.
pub const CSV_EXTENSION: &str = "csv";

/// Options for converting workbooks to delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Columns whose values are serial dates
    pub date_columns: DateColumns,

    /// Field delimiter byte
    pub delimiter: u8,

    /// Directory for written tables (None = next to the input file)
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            date_columns: DateColumns::default(),
            delimiter: b',',
            output_dir: None,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of date columns.
    pub fn with_date_columns(mut self, columns: DateColumns) -> Self {
        self.date_columns = columns;
        self
    }

    /// Add one more date column.
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_columns.insert(column);
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Write tables into `dir` instead of next to their inputs.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Where the table for `input` is written: same stem, `.csv` extension.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let file_name = input.with_extension(CSV_EXTENSION);
        match (&self.output_dir, file_name.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => file_name,
        }
    }
}
