//! Output rendering for normalized tables.
//!
//! # Example
//!
//! ```no_run
//! use unsheet::{read_table, render::*};
//!
//! let options = ConvertOptions::default();
//! if let Some(table) = read_table("Productos.xlsx", &options)? {
//!     let csv = to_csv_string(&table, &options)?;
//!     print!("{}", csv);
//! }
//! # Ok::<(), unsheet::Error>(())
//! ```

mod csv;
mod options;

pub use self::csv::{to_csv_string, write_csv, write_csv_file};
pub use options::{ConvertOptions, CSV_EXTENSION};
