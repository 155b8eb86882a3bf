//! Converting several workbooks at once.
//!
//! Workbooks share nothing, so each one is converted on its own rayon task.
//! A failure is recorded against its file and never stops the others.

use crate::error::ErrorKind;
use crate::render::ConvertOptions;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of converting one workbook.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    /// A table was written.
    Converted {
        /// Path of the written table
        output: PathBuf,
        /// Number of data rows written
        rows: usize,
    },
    /// The worksheet had no rows; nothing was written.
    Empty,
    /// Conversion failed.
    Failed {
        /// Failure class
        kind: ErrorKind,
        /// Error message
        message: String,
    },
}

/// Report entry for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// The workbook that was converted
    pub input: PathBuf,
    /// What happened to it
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    /// Whether this file failed.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// Per-file results of a batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One entry per input file
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.is_failure()).count()
    }

    /// Number of files that did not fail.
    pub fn succeeded(&self) -> usize {
        self.files.len() - self.failed()
    }

    /// Whether every file converted (or was empty) without error.
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Serialize the report as JSON.
    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| crate::Error::Io(e.into()))
    }
}

/// Convert one workbook and describe the outcome.
pub fn convert_one(input: &Path, options: &ConvertOptions) -> FileReport {
    let status = match crate::read_table(input, options) {
        Ok(Some(table)) => {
            let output = options.output_path(input);
            match crate::render::write_csv_file(&table, &output, options) {
                Ok(()) => FileStatus::Converted {
                    output,
                    rows: table.row_count(),
                },
                Err(e) => failed(input, e),
            }
        }
        Ok(None) => {
            log::warn!("{}: worksheet has no rows, nothing written", input.display());
            FileStatus::Empty
        }
        Err(e) => failed(input, e),
    };

    FileReport {
        input: input.to_path_buf(),
        status,
    }
}

fn failed(input: &Path, err: crate::Error) -> FileStatus {
    log::warn!("{}: {}", input.display(), err);
    FileStatus::Failed {
        kind: err.kind(),
        message: err.to_string(),
    }
}

/// Convert every input in parallel and report each outcome individually.
///
/// # Example
///
/// ```no_run
/// use unsheet::{convert_files, render::ConvertOptions};
///
/// let report = convert_files(
///     &["Clientes.xlsx", "Productos.xlsx", "Ventas.xlsx", "Detalle_ventas.xlsx"],
///     &ConvertOptions::default(),
/// );
/// for file in &report.files {
///     println!("{}: {:?}", file.input.display(), file.status);
/// }
/// ```
pub fn convert_files<P: AsRef<Path> + Sync>(inputs: &[P], options: &ConvertOptions) -> BatchReport {
    let files = inputs
        .par_iter()
        .map(|input| convert_one(input.as_ref(), options))
        .collect();
    BatchReport { files }
}
