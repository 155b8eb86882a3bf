//! XLSX (Excel) worksheet decoding.
//!
//! Only the first worksheet of a workbook is read. Styles, formulas and
//! merged ranges are ignored; cell text comes out exactly as stored.
//!
//! # Example
//!
//! ```no_run
//! use unsheet::xlsx::XlsxReader;
//!
//! let reader = XlsxReader::open("Clientes.xlsx")?;
//! for row in reader.rows()? {
//!     println!("{}", row.join(" | "));
//! }
//! # Ok::<(), unsheet::Error>(())
//! ```

mod parser;
mod reference;
mod shared_strings;
mod sheet;

pub use parser::XlsxReader;
pub use reference::{column_index, column_label, parse_cell_ref, CellRef};
pub use shared_strings::SharedStrings;
pub use sheet::parse_rows;
