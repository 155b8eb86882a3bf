//! Worksheet row reconstruction.
//!
//! Worksheets store cells sparsely: empty cells are simply not written.
//! Each `<c>` carries its own `r="C12"` position, which is used to put the
//! value back at the right column and fill the gap before it with empty
//! strings.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};

use super::reference::parse_cell_ref;
use super::shared_strings::SharedStrings;

/// Last column Excel can address (`XFD`).
const MAX_COLUMNS: usize = 16_384;

/// How a cell's text should be interpreted, from its `t` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    /// `t="s"`: the value is an index into the shared strings table
    Shared,
    /// `t="inlineStr"`: the text lives in a nested `<is>` element
    Inline,
    /// Numbers, booleans, errors, formula strings: `<v>` as written
    Plain,
}

impl CellKind {
    fn from_attr(value: Option<&[u8]>) -> Self {
        match value {
            Some(b"s") => CellKind::Shared,
            Some(b"inlineStr") => CellKind::Inline,
            _ => CellKind::Plain,
        }
    }
}

/// Attributes of the `<c>` element currently being read.
#[derive(Debug)]
struct PendingCell {
    reference: Option<String>,
    kind: CellKind,
    text: String,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let mut reference = None;
        let mut kind = None;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => reference = Some(String::from_utf8_lossy(&attr.value).to_string()),
                b"t" => kind = Some(attr.value.to_vec()),
                _ => {}
            }
        }
        Self {
            reference,
            kind: CellKind::from_attr(kind.as_deref()),
            text: String::new(),
        }
    }
}

/// Parse worksheet XML into dense rows, header first.
///
/// Each row is as long as its last written cell; rows are not padded to a
/// common width here. Rows without cells are kept as empty rows.
pub fn parse_rows(xml: &str, shared_strings: &SharedStrings) -> Result<Vec<Vec<String>>> {
    let mut reader = quick_xml::Reader::from_str(xml);

    let mut rows = Vec::new();
    let mut buf = Vec::new();
    let mut current_row: Option<Vec<String>> = None;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut phonetic_depth = 0usize;
    // Open elements; quick-xml does not report unclosed ones at end of input
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"row" => current_row = Some(Vec::new()),
                    b"c" if current_row.is_some() => {
                        cell = Some(PendingCell::from_start(e));
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline = true,
                    b"rPh" if in_inline => phonetic_depth += 1,
                    b"t" if in_inline && phonetic_depth == 0 => in_value = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    if let Some(ref mut row) = current_row {
                        let pending = PendingCell::from_start(e);
                        place(row, pending.reference.as_deref(), String::new())?;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_value {
                    if let Some(ref mut pending) = cell {
                        let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                        pending.text.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if in_value {
                    if let Some(ref mut pending) = cell {
                        pending.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"row" => {
                        if let Some(row) = current_row.take() {
                            rows.push(row);
                        }
                    }
                    b"c" => {
                        if let (Some(pending), Some(row)) = (cell.take(), current_row.as_mut()) {
                            let value = resolve_value(&pending, shared_strings)?;
                            place(row, pending.reference.as_deref(), value)?;
                        }
                        in_value = false;
                        in_inline = false;
                    }
                    b"v" | b"t" => in_value = false,
                    b"is" => in_inline = false,
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 || current_row.is_some() || cell.is_some() {
                    return Err(Error::XmlParse(format!(
                        "worksheet ends with {} unclosed element(s) after {} rows",
                        depth,
                        rows.len()
                    )));
                }
                break;
            }
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    log::debug!("reconstructed {} worksheet rows", rows.len());
    Ok(rows)
}

/// Resolve the text of a finished cell.
fn resolve_value(cell: &PendingCell, shared_strings: &SharedStrings) -> Result<String> {
    match cell.kind {
        CellKind::Shared => {
            let raw = cell.text.trim();
            if raw.is_empty() {
                return Ok(String::new());
            }
            let index = raw.parse::<usize>().map_err(|_| {
                Error::Reference(format!(
                    "shared string index {:?} in cell {} is not an integer",
                    raw,
                    cell.reference.as_deref().unwrap_or("?")
                ))
            })?;
            shared_strings
                .get(index)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Reference(format!(
                        "shared string index {} out of range ({} entries)",
                        index,
                        shared_strings.len()
                    ))
                })
        }
        CellKind::Inline | CellKind::Plain => Ok(cell.text.clone()),
    }
}

/// Put `value` at the column named by `reference`, growing the row with
/// empty strings as needed. Cells without a reference go after the last one.
fn place(row: &mut Vec<String>, reference: Option<&str>, value: String) -> Result<()> {
    let index = match reference {
        Some(r) => parse_cell_ref(r)?.col,
        None => row.len(),
    };
    if index >= MAX_COLUMNS {
        return Err(Error::Reference(format!(
            "cell {} is beyond the last worksheet column",
            reference.unwrap_or("?")
        )));
    }

    if row.len() < index + 1 {
        row.resize(index + 1, String::new());
    }
    row[index] = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            rows
        )
    }

    fn strings(items: &[&str]) -> SharedStrings {
        let body: String = items.iter().map(|s| format!("<si><t>{}</t></si>", s)).collect();
        SharedStrings::parse(&format!("<sst>{}</sst>", body)).unwrap()
    }

    #[test]
    fn test_sparse_row_is_filled() {
        let xml = sheet(r#"<row r="1"><c r="A1"><v>1</v></c><c r="C1"><v>3</v></c></row>"#);
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["1", "", "3"]]);
    }

    #[test]
    fn test_shared_string_cells() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
               <row r="2"><c r="A2"><v>7</v></c><c r="B2" t="s"><v>2</v></c></row>"#,
        );
        let ss = strings(&["id", "nombre", "Ana"]);
        let rows = parse_rows(&xml, &ss).unwrap();
        assert_eq!(rows, vec![vec!["id", "nombre"], vec!["7", "Ana"]]);
    }

    #[test]
    fn test_row_length_follows_last_cell() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><v>2</v></c><c r="C1"><v>3</v></c></row>
               <row r="2"><c r="A2"><v>4</v></c></row>"#,
        );
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1], vec!["4"]);
    }

    #[test]
    fn test_inline_strings_without_shared_table() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>nombre</t></is></c></row>
               <row r="2"><c r="B2" t="inlineStr"><is><r><t>An</t></r><r><t>a</t></r></is></c></row>"#,
        );
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["nombre"], vec!["", "Ana"]]);
    }

    #[test]
    fn test_formula_text_ignored() {
        let xml = sheet(r#"<row r="1"><c r="A1"><f>SUM(B1:C1)</f><v>42</v></c></row>"#);
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["42"]]);
    }

    #[test]
    fn test_empty_rows_and_cells() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>x</v></c></row><row r="2"/><row r="3"><c r="B3" s="1"/></row>"#,
        );
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec!["", ""]);
    }

    #[test]
    fn test_cells_without_reference_append() {
        let xml = sheet(r#"<row><c><v>a</v></c><c><v>b</v></c><c r="D1"><v>d</v></c></row>"#);
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["a", "b", "", "d"]]);
    }

    #[test]
    fn test_empty_shared_index_is_empty_value() {
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v></v></c></row>"#);
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec![""]]);
    }

    #[test]
    fn test_bad_shared_index() {
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>abc</v></c></row>"#);
        let err = parse_rows(&xml, &strings(&["x"])).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));

        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>5</v></c></row>"#);
        let err = parse_rows(&xml, &strings(&["x"])).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));
    }

    #[test]
    fn test_bad_cell_reference() {
        let xml = sheet(r#"<row r="1"><c r="11"><v>1</v></c></row>"#);
        let err = parse_rows(&xml, &SharedStrings::default()).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));

        let xml = sheet(r#"<row r="1"><c r="ZZZZ1"><v>1</v></c></row>"#);
        let err = parse_rows(&xml, &SharedStrings::default()).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));
    }

    #[test]
    fn test_escaped_text() {
        let xml = sheet(r#"<row r="1"><c r="A1" t="str"><v>a &lt; b</v></c></row>"#);
        let rows = parse_rows(&xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["a < b"]]);
    }

    #[test]
    fn test_truncated_worksheet() {
        let xml = r#"<worksheet><sheetData><row><c r="A1"><v>id</v></c></row><row><c r="A2"><v>1</v></c>"#;
        let err = parse_rows(xml, &SharedStrings::default()).unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));

        // All rows closed but the document itself is cut short
        let xml = r#"<worksheet><sheetData><row><c r="A1"><v>id</v></c></row>"#;
        let err = parse_rows(xml, &SharedStrings::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Archive);
    }

    #[test]
    fn test_mismatched_tags() {
        let xml = sheet(r#"<row r="1"><c r="A1"><v>1</c></v></row>"#);
        let err = parse_rows(&xml, &SharedStrings::default()).unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }
}
