//! # unsheet
//!
//! Minimal XLSX worksheet extraction to normalized CSV.
//!
//! unsheet opens an XLSX package, reads its first worksheet and shared
//! strings, rebuilds dense rows from the sparse cell layout, normalizes
//! serial dates and numbers, and writes a flat CSV table.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unsheet::{convert_file, render::ConvertOptions};
//!
//! // Writes Ventas.csv next to Ventas.xlsx
//! let written = convert_file("Ventas.xlsx", &ConvertOptions::default())?;
//! println!("{:?}", written);
//! # Ok::<(), unsheet::Error>(())
//! ```
//!
//! ## Step by step
//!
//! ```no_run
//! use unsheet::model::Table;
//! use unsheet::normalize::DateColumns;
//! use unsheet::xlsx::XlsxReader;
//!
//! let reader = XlsxReader::open("Clientes.xlsx")?;
//! let rows = reader.rows()?;
//! let table = Table::from_rows(rows, &DateColumns::default());
//! # Ok::<(), unsheet::Error>(())
//! ```

pub mod batch;
pub mod container;
pub mod error;
pub mod model;
pub mod normalize;
pub mod render;
pub mod xlsx;

// Re-exports
pub use batch::{convert_files, BatchReport, FileReport, FileStatus};
pub use container::Package;
pub use error::{Error, ErrorKind, Result};
pub use model::Table;
pub use normalize::{normalize_value, DateColumns};
pub use render::ConvertOptions;
pub use xlsx::XlsxReader;

use std::path::{Path, PathBuf};

/// Read the first worksheet of a workbook as dense raw rows, header first.
///
/// Rows are not padded or normalized.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
    XlsxReader::open(path)?.rows()
}

/// Read the first worksheet as a normalized table.
///
/// Returns `Ok(None)` when the worksheet has no rows.
pub fn read_table(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Option<Table>> {
    let path = path.as_ref();
    let rows = read_rows(path)?;
    log::debug!("{}: {} rows read", path.display(), rows.len());
    Ok(Table::from_rows(rows, &options.date_columns))
}

/// Convert a workbook to a CSV file named after it.
///
/// Returns the path written, or `None` when the worksheet has no rows and
/// nothing was written.
///
/// # Example
///
/// ```no_run
/// use unsheet::{convert_file, ConvertOptions};
///
/// let options = ConvertOptions::new().with_output_dir("csv");
/// if let Some(path) = convert_file("Detalle_ventas.xlsx", &options)? {
///     println!("Generado: {}", path.display());
/// }
/// # Ok::<(), unsheet::Error>(())
/// ```
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    let table = match read_table(path, options)? {
        Some(table) => table,
        None => return Ok(None),
    };

    let output = options.output_path(path);
    render::write_csv_file(&table, &output, options)?;
    Ok(Some(output))
}
