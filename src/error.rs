//! Error types for the unsheet library.

use std::io;
use thiserror::Error;

/// Result type alias for unsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing the output table.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be read or is not a ZIP container.
    #[error("ZIP archive error: {0}")]
    Archive(String),

    /// A required part is missing from the package.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// Error parsing XML content of a part.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A cell reference or shared string index could not be resolved.
    #[error("Invalid reference: {0}")]
    Reference(String),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The package itself is unusable.
    Archive,
    /// The worksheet contents reference something that does not exist.
    Reference,
    /// Writing the output table failed.
    Io,
}

impl Error {
    /// Group this error into one of the three failure classes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Archive(_) | Error::MissingPart(_) | Error::XmlParse(_) => ErrorKind::Archive,
            Error::Reference(_) => ErrorKind::Reference,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Error::Io(e),
            other => Error::Io(io::Error::other(format!("CSV write failed: {:?}", other))),
        }
    }
}
