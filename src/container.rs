//! ZIP package access for XLSX workbooks.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// A relationship entry from a .rels part.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path, relative to the source part
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Relationships parsed from a .rels part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Find the first internal relationship whose type URI ends with `suffix`.
    ///
    /// Strict and transitional OOXML use different namespace prefixes for the
    /// same relationship types, so callers match on the trailing segment.
    pub fn find_by_type_suffix(&self, suffix: &str) -> Option<&Relationship> {
        let mut matches: Vec<&Relationship> = self
            .by_id
            .values()
            .filter(|r| !r.external && r.rel_type.ends_with(suffix))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches.into_iter().next()
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// Once UTF-16 content has been transcoded into a Rust `String`, the
/// declaration must stop claiming UTF-16 or quick-xml will misread it.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
///
/// Workbooks written by Excel are UTF-8, but some third-party exporters
/// emit UTF-16 parts.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| Error::XmlParse(format!("part is not valid UTF-8: {}", e)));
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let content = decode_utf16(rest, u16::from_le_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let content = decode_utf16(rest, u16::from_be_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // ASCII in UTF-16 LE leaves zero bytes in odd positions
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16(bytes, u16::from_le_bytes)
                    .map(|c| fix_xml_encoding_declaration(&c))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16(bytes, u16::from_be_bytes)
                    .map(|c| fix_xml_encoding_declaration(&c))
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

/// Decode UTF-16 bytes with the given byte order.
fn decode_utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]));

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::XmlParse(format!("part is not valid UTF-16: {}", e)))
}

/// Source read failures count as an unusable package.
fn unreadable(source: impl std::fmt::Display, err: std::io::Error) -> Error {
    Error::Archive(format!("cannot read {}: {}", source, err))
}

/// An XLSX package: a ZIP archive of named XML parts.
///
/// The package is opened for one conversion and released when dropped.
pub struct Package {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl Package {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use unsheet::container::Package;
    ///
    /// let package = Package::open("Clientes.xlsx")?;
    /// assert!(package.exists("xl/workbook.xml"));
    /// # Ok::<(), unsheet::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| unreadable(path.display(), e))?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| unreadable(path.display(), e))?;
        Self::from_bytes(data)
    }

    /// Create a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let archive = zip::ZipArchive::new(cursor)?;
        log::debug!("opened package with {} parts", archive.len());
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Create a package from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| unreadable("reader", e))?;
        Self::from_bytes(data)
    }

    /// Read an XML part as a string, transcoding UTF-16 parts to UTF-8.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        decode_xml_bytes(&bytes)
    }

    /// Read a part as raw bytes.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingPart(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::Archive(format!("failed to inflate {}: {}", path, e)))?;
        Ok(data)
    }

    /// Read an optional XML part. `Ok(None)` when the part is absent.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        if self.exists(path) {
            self.read_xml(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all part names in the archive, sorted.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    /// Read the relationships belonging to `part_path`.
    ///
    /// A missing .rels part yields an empty collection.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let path = Path::new(part_path);
        let parent = path.parent().unwrap_or(Path::new(""));
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        let rels_path = if parent.as_os_str().is_empty() {
            format!("_rels/{}.rels", filename)
        } else {
            format!("{}/_rels/{}.rels", parent.display(), filename)
        };

        match self.read_optional_xml(&rels_path)? {
            Some(xml) => parse_relationships(&xml),
            None => Ok(Relationships::new()),
        }
    }

    /// Resolve a relationship target relative to the part that declared it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }
}

/// Parse the XML of a .rels part.
fn parse_relationships(content: &str) -> Result<Relationships> {
    let mut rels = Relationships::new();
    if content.trim().is_empty() {
        return Ok(rels);
    }

    let mut reader = quick_xml::Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut external = false;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        b"TargetMode" => {
                            external =
                                String::from_utf8_lossy(&attr.value).to_lowercase() == "external"
                        }
                        _ => {}
                    }
                }

                if !id.is_empty() {
                    rels.add(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, data) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            Package::resolve_path("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            Package::resolve_path("xl/worksheets/sheet1.xml", "../sharedStrings.xml"),
            "xl/sharedStrings.xml"
        );
        assert_eq!(
            Package::resolve_path("xl/workbook.xml", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
    }

    #[test]
    fn test_read_parts() {
        let data = build_zip(&[
            ("xl/workbook.xml", b"<workbook/>"),
            ("xl/worksheets/sheet1.xml", b"<worksheet/>"),
        ]);
        let package = Package::from_bytes(data).unwrap();

        assert!(package.exists("xl/workbook.xml"));
        assert!(!package.exists("xl/sharedStrings.xml"));
        assert_eq!(
            package.list_files(),
            vec!["xl/workbook.xml", "xl/worksheets/sheet1.xml"]
        );
        assert_eq!(package.read_xml("xl/workbook.xml").unwrap(), "<workbook/>");
        assert!(package
            .read_optional_xml("xl/sharedStrings.xml")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_part() {
        let data = build_zip(&[("xl/workbook.xml", b"<workbook/>")]);
        let package = Package::from_bytes(data).unwrap();
        let err = package.read_xml("xl/worksheets/sheet1.xml").unwrap_err();
        assert!(matches!(err, Error::MissingPart(ref p) if p == "xl/worksheets/sheet1.xml"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_bytes(b"id,fecha,monto\n1,2,3\n".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[test]
    fn test_unopenable_path_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Package::open(dir.path().join("Ventas.xlsx")).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Archive);

        // A directory opens on some platforms but never reads as a file
        let err = Package::open(dir.path()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Archive);
    }

    #[test]
    fn test_undecodable_part() {
        let err = decode_xml_bytes(b"\xEF\xBB\xBF<sst>\xFF</sst>").unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Archive);

        // Unpaired surrogate
        let err = decode_xml_bytes(b"\xFF\xFE<\0\x00\xD8").unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));

        let data = build_zip(&[("xl/sharedStrings.xml", b"\xEF\xBB\xBF<sst>\xFF</sst>")]);
        let package = Package::from_bytes(data).unwrap();
        let err = package.read_xml("xl/sharedStrings.xml").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Archive);
    }

    #[test]
    fn test_relationships() {
        let rels = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;
        let data = build_zip(&[("xl/_rels/workbook.xml.rels", rels)]);
        let package = Package::from_bytes(data).unwrap();

        let rels = package.read_relationships("xl/workbook.xml").unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels.get("rId1").unwrap().target, "worksheets/sheet1.xml");
        assert!(rels.get("rId3").unwrap().external);
        assert_eq!(
            rels.find_by_type_suffix("/sharedStrings").unwrap().id,
            "rId2"
        );
        assert!(rels.find_by_type_suffix("/hyperlink").is_none());

        let missing = package.read_relationships("xl/worksheets/sheet1.xml").unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_utf16_decoding() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>").unwrap(), "<?xml>");
    }

    #[test]
    fn test_utf16_declaration_rewritten() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><sst/>";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_xml_bytes(&bytes).unwrap();
        assert_eq!(decoded, "<?xml version=\"1.0\" encoding=\"UTF-8\"?><sst/>");
    }
}
