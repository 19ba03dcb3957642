//! XML codec tests.

use std::fs;

use crate::format::{FormatError, FormatTag, xml};
use crate::tests::write_file;

const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<order id="7" status="open">
    <item>a &amp; b</item>
    <item>two</item>
    <customer>
        <name>Maria</name>
        <flag/>
    </customer>
    <note><![CDATA[<raw>]]></note>
</order>"#;

#[test]
fn import_builds_navigable_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.xml");
    write_file(&path, DOC);

    let root = xml::import(&path).expect("import xml");
    assert_eq!(root.name, "order");
    assert_eq!(root.attribute("id"), Some("7"));
    assert_eq!(root.attribute("status"), Some("open"));
    assert_eq!(root.children_named("item").count(), 2);
    assert_eq!(root.child_text("item"), Some("a & b"));
    assert_eq!(root.child_text("note"), Some("<raw>"));
    assert_eq!(root.find("name").map(|e| e.text.as_str()), Some("Maria"));
    assert!(root.find("flag").is_some());
    assert!(root.find("missing").is_none());
}

#[test]
fn mismatched_tags_are_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    write_file(&path, "<root><a></root>");

    let err = xml::import(&path).unwrap_err();
    assert!(
        matches!(
            err,
            FormatError::Parse {
                tag: FormatTag::Xml,
                ..
            }
        ),
        "{err:?}"
    );
}

#[test]
fn unclosed_and_empty_documents_are_parse_errors() {
    let dir = tempfile::tempdir().unwrap();

    let unclosed = dir.path().join("unclosed.xml");
    write_file(&unclosed, "<root><a>text</a>");
    assert!(matches!(
        xml::import(&unclosed),
        Err(FormatError::Parse { .. })
    ));

    let empty = dir.path().join("empty.xml");
    write_file(&empty, "");
    assert!(matches!(xml::import(&empty), Err(FormatError::Parse { .. })));
}

#[test]
fn export_writes_declaration_root_and_escaped_children() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xml");

    xml::export("export", [("timestamp", "1700000000"), ("note", "a<b")], &path)
        .expect("export xml");

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#), "{text}");
    assert!(text.contains("<timestamp>1700000000</timestamp>"), "{text}");
    assert!(text.contains("<note>a&lt;b</note>"), "{text}");

    let root = xml::import(&path).unwrap();
    assert_eq!(root.name, "export");
    assert_eq!(root.child_text("note"), Some("a<b"));
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["timestamp", "note"]);
}

#[test]
fn text_keeps_whitespace_and_mixed_content_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.xml");
    write_file(&path, "<r>\n  <a>  padded  </a>\n  <b>x <i>y</i> z</b>\n</r>");

    let root = xml::import(&path).expect("import xml");
    assert_eq!(root.text, "");
    assert_eq!(root.child_text("a"), Some("  padded  "));

    let b = root.child("b").expect("b element");
    assert_eq!(b.text, "x ");
    let i = b.child("i").expect("i element");
    assert_eq!(i.text, "y");
    assert_eq!(i.tail, " z");
    // Indentation between elements is dropped.
    assert_eq!(root.child("a").map(|a| a.tail.as_str()), Some(""));
}
