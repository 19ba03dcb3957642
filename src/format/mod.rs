//! Format classification and per-format codecs.
//!
//! This module provides:
//! - `FormatTag`: Closed set of formats a file can be classified as
//! - `detect`: Extension-based format detection
//! - `FormatError`: Errors raised by the codecs
//! - `csv`, `json`, `xml`, `tabular`: Import/export functions per format
//! - `convert`: Row to JSON record conversion used on ingest and export

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod convert;
pub mod csv;
pub mod json;
pub mod tabular;
pub mod xml;

pub use xml::XmlElement;

/// Ordered rows of literal string cells, as read from or written to CSV.
pub type Rows = Vec<Vec<String>>;

/// Classification of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Csv,
    Json,
    Xml,
    /// Spreadsheet workbooks (xlsx, xls)
    Tabular,
    /// Anything else; never processed automatically
    Unknown,
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatTag::Csv => write!(f, "csv"),
            FormatTag::Json => write!(f, "json"),
            FormatTag::Xml => write!(f, "xml"),
            FormatTag::Tabular => write!(f, "tabular"),
            FormatTag::Unknown => write!(f, "unknown"),
        }
    }
}

impl FormatTag {
    /// Formats that have a default handler and a codec.
    pub const SUPPORTED: [FormatTag; 4] = [
        FormatTag::Csv,
        FormatTag::Json,
        FormatTag::Xml,
        FormatTag::Tabular,
    ];

    /// Map a file extension to a tag. Case-insensitive, a leading dot is ignored.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        match ext.to_ascii_lowercase().as_str() {
            "csv" => FormatTag::Csv,
            "json" => FormatTag::Json,
            "xml" => FormatTag::Xml,
            "xlsx" | "xls" => FormatTag::Tabular,
            _ => FormatTag::Unknown,
        }
    }

    /// Parse a format name as typed by an operator (`export <format>`).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(FormatTag::Csv),
            "json" => Some(FormatTag::Json),
            "xml" => Some(FormatTag::Xml),
            "tabular" | "excel" | "xlsx" | "xls" => Some(FormatTag::Tabular),
            _ => None,
        }
    }

    /// Extensions recognised for this tag.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FormatTag::Csv => &["csv"],
            FormatTag::Json => &["json"],
            FormatTag::Xml => &["xml"],
            FormatTag::Tabular => &["xlsx", "xls"],
            FormatTag::Unknown => &[],
        }
    }

    /// Extension used when this crate writes a file of this format.
    pub fn output_extension(&self) -> Option<&'static str> {
        self.extensions().first().copied()
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FormatTag::Unknown)
    }
}

/// Detect the format of a file from its extension.
///
/// Pure function of the path; performs no I/O. Files without an extension are
/// `Unknown`.
pub fn detect(path: &Path) -> FormatTag {
    path.extension()
        .and_then(|e| e.to_str())
        .map(FormatTag::from_extension)
        .unwrap_or(FormatTag::Unknown)
}

/// Errors that can occur during format operations.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input is malformed for the given format
    #[error("failed to parse {} as {tag}: {source}", path.display())]
    Parse {
        tag: FormatTag,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Data could not be encoded or written
    #[error("failed to write {} as {tag}: {source}", path.display())]
    Write {
        tag: FormatTag,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error opening or creating the file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The format has no codec
    #[error("Format '{0}' cannot be read or written")]
    Unsupported(FormatTag),
}

impl FormatError {
    pub(crate) fn parse<E>(tag: FormatTag, path: &Path, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FormatError::Parse {
            tag,
            path: path.to_path_buf(),
            source: err.into(),
        }
    }

    pub(crate) fn write<E>(tag: FormatTag, path: &Path, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FormatError::Write {
            tag,
            path: path.to_path_buf(),
            source: err.into(),
        }
    }

    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        FormatError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }
}
