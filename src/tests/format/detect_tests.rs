//! Extension-based detection.

use std::path::Path;

use crate::format::{FormatTag, detect};

#[test]
fn detects_supported_extensions() {
    assert_eq!(detect(Path::new("in/data.csv")), FormatTag::Csv);
    assert_eq!(detect(Path::new("in/data.json")), FormatTag::Json);
    assert_eq!(detect(Path::new("in/data.xml")), FormatTag::Xml);
    assert_eq!(detect(Path::new("in/book.xlsx")), FormatTag::Tabular);
    assert_eq!(detect(Path::new("in/book.xls")), FormatTag::Tabular);
}

#[test]
fn detection_ignores_case() {
    assert_eq!(detect(Path::new("REPORT.CSV")), FormatTag::Csv);
    assert_eq!(detect(Path::new("Book.XlSx")), FormatTag::Tabular);
}

#[test]
fn anything_else_is_unknown() {
    assert_eq!(detect(Path::new("notes.txt")), FormatTag::Unknown);
    assert_eq!(detect(Path::new("archive.tar.gz")), FormatTag::Unknown);
    assert_eq!(detect(Path::new("Makefile")), FormatTag::Unknown);
    // A dotfile has no extension.
    assert_eq!(detect(Path::new(".csv")), FormatTag::Unknown);
}

#[test]
fn detection_does_not_touch_the_filesystem() {
    assert_eq!(
        detect(Path::new("/definitely/not/here/data.json")),
        FormatTag::Json
    );
}

#[test]
fn from_extension_accepts_leading_dot() {
    assert_eq!(FormatTag::from_extension(".xml"), FormatTag::Xml);
    assert_eq!(FormatTag::from_extension("xml"), FormatTag::Xml);
    assert_eq!(FormatTag::from_extension(""), FormatTag::Unknown);
}

#[test]
fn from_name_accepts_spreadsheet_aliases() {
    for name in ["tabular", "excel", "xlsx", "xls", "EXCEL"] {
        assert_eq!(FormatTag::from_name(name), Some(FormatTag::Tabular), "{name}");
    }
    assert_eq!(FormatTag::from_name("csv"), Some(FormatTag::Csv));
    assert_eq!(FormatTag::from_name("pdf"), None);
    assert_eq!(FormatTag::from_name("unknown"), None);
}

#[test]
fn output_extensions() {
    assert_eq!(FormatTag::Csv.output_extension(), Some("csv"));
    assert_eq!(FormatTag::Tabular.output_extension(), Some("xlsx"));
    assert_eq!(FormatTag::Unknown.output_extension(), None);
}

#[test]
fn supported_set_excludes_unknown() {
    assert!(FormatTag::SUPPORTED.iter().all(FormatTag::is_supported));
    assert!(!FormatTag::Unknown.is_supported());
    assert_eq!(FormatTag::Tabular.to_string(), "tabular");
}
