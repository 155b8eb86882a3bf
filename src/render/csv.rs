//! Delimited text (CSV) renderer.

use crate::error::Result;
use crate::model::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::options::ConvertOptions;

fn writer_for<W: Write>(sink: W, options: &ConvertOptions) -> ::csv::Writer<W> {
    ::csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .terminator(::csv::Terminator::CRLF)
        .flexible(false)
        .from_writer(sink)
}

/// Write a table as delimited text: header first, then every data row.
///
/// Rows are padded to the header's width before writing, so every record
/// has the same field count.
pub fn write_csv<W: Write>(table: &Table, mut sink: W, options: &ConvertOptions) -> Result<()> {
    let width = table.width();
    if width == 0 {
        // csv would write a zero-field record as `""`, which reads back as one field
        for _ in 0..=table.rows.len() {
            sink.write_all(b"\r\n")?;
        }
        sink.flush()?;
        return Ok(());
    }

    let mut writer = writer_for(sink, options);

    writer.write_record(&table.header)?;
    for row in &table.rows {
        if row.len() == width {
            writer.write_record(row)?;
        } else {
            let padded = row
                .iter()
                .map(String::as_str)
                .chain(std::iter::repeat(""))
                .take(width);
            writer.write_record(padded)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write a table to a file, replacing any existing file.
pub fn write_csv_file(table: &Table, path: impl AsRef<Path>, options: &ConvertOptions) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file), options)?;
    log::debug!("wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

/// Render a table to a CSV string.
pub fn to_csv_string(table: &Table, options: &ConvertOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer, options)?;
    // csv only emits what it was given, which is all valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_headerless_table_writes_empty_lines() {
        let t = table(&[], &[&[], &["stray"]]);
        let csv = to_csv_string(&t, &ConvertOptions::default()).unwrap();
        assert_eq!(csv, "\r\n\r\n\r\n");
    }

    #[test]
    fn test_to_csv_string() {
        let t = table(&["id", "nombre"], &[&["1", "Ana"], &["2", "Luis"]]);
        let csv = to_csv_string(&t, &ConvertOptions::default()).unwrap();
        assert_eq!(csv, "id,nombre\r\n1,Ana\r\n2,Luis\r\n");
    }

    #[test]
    fn test_quoting() {
        let t = table(&["nombre", "nota"], &[&["Pérez, Ana", "dijo \"hola\""]]);
        let csv = to_csv_string(&t, &ConvertOptions::default()).unwrap();
        assert_eq!(
            csv,
            "nombre,nota\r\n\"Pérez, Ana\",\"dijo \"\"hola\"\"\"\r\n"
        );
    }

    #[test]
    fn test_short_rows_padded() {
        let t = table(&["a", "b", "c"], &[&["1"], &[]]);
        let csv = to_csv_string(&t, &ConvertOptions::default()).unwrap();
        assert_eq!(csv, "a,b,c\r\n1,,\r\n,,\r\n");
    }

    #[test]
    fn test_custom_delimiter() {
        let t = table(&["a", "b"], &[&["1,5", "2"]]);
        let opts = ConvertOptions::new().with_delimiter(b';');
        let csv = to_csv_string(&t, &opts).unwrap();
        assert_eq!(csv, "a;b\r\n1,5;2\r\n");
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old contents that are longer than the new ones").unwrap();

        let t = table(&["a"], &[&["1"]]);
        write_csv_file(&t, &path, &ConvertOptions::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\r\n1\r\n");
    }

    #[test]
    fn test_unwritable_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_csv_file(&table(&["a"], &[]), &path, &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
