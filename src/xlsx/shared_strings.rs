//! XLSX shared strings parsing.

use crate::error::{Error, Result};
use quick_xml::events::Event;

/// Shared strings table.
///
/// Entry order is the index space cells refer to, so entries are kept
/// exactly in document order.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse shared strings from the XML of `xl/sharedStrings.xml`.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        let mut in_si = false;
        let mut in_t = false;
        // Depth inside <rPh>; phonetic hints are not part of the cell text
        let mut phonetic_depth = 0usize;
        let mut current_text = String::new();
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    match e.local_name().as_ref() {
                        b"si" => {
                            in_si = true;
                            current_text.clear();
                        }
                        b"rPh" if in_si => phonetic_depth += 1,
                        b"t" if in_si && phonetic_depth == 0 => in_t = true,
                        _ => {}
                    }
                }
                Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"si" {
                        strings.push(String::new());
                    }
                }
                Ok(Event::Text(e)) => {
                    if in_t {
                        let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                        current_text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if in_t {
                        current_text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::End(e)) => {
                    depth = depth.saturating_sub(1);
                    match e.local_name().as_ref() {
                        b"si" => {
                            strings.push(std::mem::take(&mut current_text));
                            in_si = false;
                        }
                        b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                        b"t" => in_t = false,
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    if in_si || depth > 0 {
                        return Err(Error::XmlParse(format!(
                            "shared strings end inside an element after {} entries",
                            strings.len()
                        )));
                    }
                    break;
                }
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        log::debug!("parsed {} shared strings", strings.len());
        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
