//! Data model for decoded worksheets.

mod table;

pub use table::*;
