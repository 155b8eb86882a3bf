//! XLSX workbook reader.

use crate::container::Package;
use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::path::Path;

use super::shared_strings::SharedStrings;
use super::sheet::parse_rows;

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const DEFAULT_SHEET_PATH: &str = "xl/worksheets/sheet1.xml";
const DEFAULT_SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// Sheet entry from workbook.xml.
#[derive(Debug, Clone)]
struct SheetInfo {
    name: String,
    rel_id: String,
}

/// Reader for the first worksheet of an XLSX workbook.
///
/// The shared strings table is parsed once when the reader is created and
/// then borrowed by every row pass.
///
/// # Example
///
/// ```no_run
/// use unsheet::xlsx::XlsxReader;
///
/// let reader = XlsxReader::open("Ventas.xlsx")?;
/// let rows = reader.rows()?;
/// println!("{} rows in {}", rows.len(), reader.worksheet_path());
/// # Ok::<(), unsheet::Error>(())
/// ```
#[derive(Debug)]
pub struct XlsxReader {
    package: Package,
    shared_strings: SharedStrings,
    worksheet_path: String,
    sheet_name: Option<String>,
}

impl XlsxReader {
    /// Open an XLSX file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package)
    }

    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        Self::from_package(package)
    }

    /// Create a reader from an already opened package.
    ///
    /// Fails with [`Error::MissingPart`] when the package has no worksheet.
    pub fn from_package(package: Package) -> Result<Self> {
        let rels = package.read_relationships(WORKBOOK_PATH)?;
        let first_sheet = Self::first_sheet(&package)?;

        let mut sheet_name = None;
        let worksheet_path = match first_sheet {
            Some(sheet) => match rels.get(&sheet.rel_id) {
                Some(rel) if !rel.external => {
                    sheet_name = Some(sheet.name);
                    Package::resolve_path(WORKBOOK_PATH, &rel.target)
                }
                _ => {
                    log::warn!(
                        "sheet {:?} has no usable relationship {:?}, falling back to {}",
                        sheet.name,
                        sheet.rel_id,
                        DEFAULT_SHEET_PATH
                    );
                    DEFAULT_SHEET_PATH.to_string()
                }
            },
            None => DEFAULT_SHEET_PATH.to_string(),
        };

        if !package.exists(&worksheet_path) {
            return Err(Error::MissingPart(worksheet_path));
        }
        log::debug!("using worksheet part {}", worksheet_path);

        let shared_strings_path = rels
            .find_by_type_suffix("/sharedStrings")
            .map(|rel| Package::resolve_path(WORKBOOK_PATH, &rel.target))
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS_PATH.to_string());

        let shared_strings = match package.read_optional_xml(&shared_strings_path)? {
            Some(xml) => SharedStrings::parse(&xml)?,
            None => {
                log::debug!("no shared strings part, using an empty table");
                SharedStrings::default()
            }
        };

        Ok(Self {
            package,
            shared_strings,
            worksheet_path,
            sheet_name,
        })
    }

    /// Find the first `<sheet>` declared in workbook.xml, if any.
    fn first_sheet(package: &Package) -> Result<Option<SheetInfo>> {
        let xml = match package.read_optional_xml(WORKBOOK_PATH)? {
            Some(xml) => xml,
            None => return Ok(None),
        };

        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                    let mut name = String::new();
                    let mut rel_id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"name" => name = String::from_utf8_lossy(&attr.value).to_string(),
                            // r:id, whatever the relationships prefix is
                            b"id" => rel_id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    return Ok(Some(SheetInfo { name, rel_id }));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(None)
    }

    /// Parse the worksheet into dense rows, header first.
    pub fn rows(&self) -> Result<Vec<Vec<String>>> {
        let xml = self.package.read_xml(&self.worksheet_path)?;
        parse_rows(&xml, &self.shared_strings)
    }

    /// The shared strings table of this workbook.
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// Part name of the worksheet being read.
    pub fn worksheet_path(&self) -> &str {
        &self.worksheet_path
    }

    /// Name of the worksheet, when declared in workbook.xml.
    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    /// Get a reference to the underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }
}
