//! Normalized table structure.

use crate::normalize::{normalize_value, DateColumns};
use serde::{Deserialize, Serialize};

/// A header plus normalized data rows, all of the header's width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, taken verbatim from the first worksheet row
    pub header: Vec<String>,

    /// Normalized data rows
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from raw worksheet rows.
    ///
    /// The first row becomes the header. Each remaining row is padded with
    /// empty strings (or cut) to the header's width and every cell is
    /// normalized by its column name. Returns `None` when there are no rows.
    pub fn from_rows(rows: Vec<Vec<String>>, date_columns: &DateColumns) -> Option<Self> {
        let mut rows = rows.into_iter();
        let header = rows.next()?;
        let width = header.len();

        let rows = rows
            .enumerate()
            .map(|(idx, row)| {
                if row.len() > width {
                    log::warn!(
                        "data row {} has {} cells but the header has {}; extra cells dropped",
                        idx + 1,
                        row.len(),
                        width
                    );
                }
                let mut cells = row.into_iter();
                header
                    .iter()
                    .map(|column| {
                        let raw = cells.next().unwrap_or_default();
                        normalize_value(column, &raw, date_columns)
                    })
                    .collect::<Vec<String>>()
            })
            .collect();

        Some(Self { header, rows })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Number of data rows (the header is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column by name, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.header.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_rows_padded_to_header() {
        let table = Table::from_rows(
            raw(&[&["id", "fecha", "monto"], &["1", "45292", "10.0"], &["2", "45293"]]),
            &DateColumns::default(),
        )
        .unwrap();

        assert_eq!(table.width(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0], vec!["1", "2024-01-01", "10"]);
        assert_eq!(table.rows[1], vec!["2", "2024-01-02", ""]);
        assert!(table.rows.iter().all(|r| r.len() == table.width()));
    }

    #[test]
    fn test_long_rows_cut_to_header() {
        let table = Table::from_rows(
            raw(&[&["a", "b"], &["1", "2", "3"]]),
            &DateColumns::default(),
        )
        .unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_header_not_normalized() {
        let table = Table::from_rows(raw(&[&[" nombre ", "2024.0"]]), &DateColumns::default())
            .unwrap();
        assert_eq!(table.header, vec![" nombre ", "2024.0"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_rows() {
        assert!(Table::from_rows(Vec::new(), &DateColumns::default()).is_none());

        let table = Table::from_rows(raw(&[&["a", "b"], &[]]), &DateColumns::default()).unwrap();
        assert_eq!(table.rows, vec![vec!["", ""]]);
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::from_rows(
            raw(&[&["id", "nombre"], &["1", " Ana "], &["2", "Luis"]]),
            &DateColumns::default(),
        )
        .unwrap();
        assert_eq!(table.column("nombre"), Some(vec!["Ana", "Luis"]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_column_on_short_rows() {
        let table = Table {
            header: vec!["id".to_string(), "monto".to_string()],
            rows: vec![vec!["1".to_string()], vec!["2".to_string(), "7".to_string()]],
        };
        assert_eq!(table.column("monto"), Some(vec!["", "7"]));
    }
}
