//! A1-style cell reference decoding.

use crate::error::{Error, Result};

/// A decoded cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Zero-based column index
    pub col: usize,
    /// One-based row number, when the reference carries one
    pub row: Option<u32>,
}

/// Decode a column label such as `"A"` or `"BA"` into a zero-based index.
///
/// Letters are digits 1..=26 with no zero digit, so `A = 0`, `Z = 25`,
/// `AA = 26`. Lowercase letters are accepted.
///
/// # Example
///
/// ```
/// use unsheet::xlsx::column_index;
///
/// assert_eq!(column_index("A")?, 0);
/// assert_eq!(column_index("AZ")?, 51);
/// # Ok::<(), unsheet::Error>(())
/// ```
pub fn column_index(label: &str) -> Result<usize> {
    if label.is_empty() {
        return Err(Error::Reference("empty column label".to_string()));
    }

    let mut index: usize = 0;
    for ch in label.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(Error::Reference(format!(
                "non-alphabetic character {:?} in column label {:?}",
                ch, label
            )));
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        index = index
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| Error::Reference(format!("column label {:?} is too long", label)))?;
    }

    Ok(index - 1)
}

/// Encode a zero-based column index as a label. Inverse of [`column_index`].
pub fn column_label(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parse a full reference such as `"C12"` or `"$C$12"`.
///
/// The row part may be absent (`"C"`); anything other than letters
/// followed by digits is rejected.
pub fn parse_cell_ref(reference: &str) -> Result<CellRef> {
    let trimmed = reference.replace('$', "");
    let split = trimmed
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (letters, digits) = trimmed.split_at(split);

    let col = column_index(letters)
        .map_err(|_| Error::Reference(format!("invalid cell reference {:?}", reference)))?;

    let row = if digits.is_empty() {
        None
    } else {
        Some(
            digits
                .parse::<u32>()
                .map_err(|_| Error::Reference(format!("invalid cell reference {:?}", reference)))?,
        )
    };

    Ok(CellRef { col, row })
}
