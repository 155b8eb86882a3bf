//! Cell text normalization.
//!
//! Worksheet cells come out of the XML as raw strings: serial numbers for
//! dates, `12.0` for whole numbers, padded text. [`normalize_value`] turns
//! them into the forms downstream tools expect: ISO dates, plain decimal
//! numbers, trimmed text.
//!
//! Dates are computed as `1899-12-30 + serial days`. This does not model
//! the fictitious 1900-02-29 that spreadsheet applications count, so
//! serials below 61 (before 1900-03-01) come out one day later than the
//! application would display them.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column names treated as dates when no other set is configured.
pub const DEFAULT_DATE_COLUMNS: [&str; 2] = ["fecha", "fecha_alta"];

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Serials beyond this many days cannot land in years 1..=9999.
const MAX_SERIAL_DAYS: f64 = 3_000_000.0;

/// The set of column names whose values are serial dates.
///
/// Names match exactly, including case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateColumns(BTreeSet<String>);

impl DateColumns {
    /// A set with no date columns.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a column name.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    /// Whether `column` holds serial dates.
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    /// Iterate the column names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for DateColumns {
    fn default() -> Self {
        DEFAULT_DATE_COLUMNS.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for DateColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Normalize one cell value according to the column it belongs to.
///
/// Never fails: text that cannot be read as a date or number is returned
/// trimmed but otherwise unchanged.
///
/// # Example
///
/// ```
/// use unsheet::normalize::{normalize_value, DateColumns};
///
/// let dates = DateColumns::default();
/// assert_eq!(normalize_value("precio", "12.0", &dates), "12");
/// assert_eq!(normalize_value("fecha", "45292", &dates), "2024-01-01");
/// ```
pub fn normalize_value(column: &str, raw: &str, date_columns: &DateColumns) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    if date_columns.contains(column) {
        return serial_to_iso_date(text).unwrap_or_else(|| text.to_string());
    }

    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => format_number(number),
        _ => text.to_string(),
    }
}

/// Render a finite number: integers without a fractional part, everything
/// else in its shortest round-trip decimal form.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 {
        if number == 0.0 {
            // also covers -0.0
            return "0".to_string();
        }
        format!("{:.0}", number)
    } else {
        format!("{}", number)
    }
}

/// Convert a serial day count into `YYYY-MM-DD`.
///
/// Fractional days are a time of day and are dropped, flooring toward the
/// earlier date.
fn serial_to_iso_date(text: &str) -> Option<String> {
    let days = text.parse::<f64>().ok()?;
    if !days.is_finite() || days.abs() > MAX_SERIAL_DAYS {
        return None;
    }

    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::microseconds((days * MICROS_PER_DAY).round() as i64);
    let date = base.checked_add_signed(offset)?.date();

    if !(1..=9999).contains(&date.year()) {
        return None;
    }
    Some(date.format("%Y-%m-%d").to_string())
}
