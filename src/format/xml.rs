//! XML codec.
//!
//! Import builds a small owned element tree navigable by tag name. Text keeps
//! its whitespace; text nodes made only of whitespace (indentation) are
//! dropped. Mixed content is kept in document order through `text` and each
//! child's `tail`. Export writes a declaration, a root element and one level
//! of text-only children.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{FormatError, FormatTag};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An element of an imported XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Tag name, including any namespace prefix
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Unescaped text inside this element, before its first child
    pub text: String,
    pub children: Vec<XmlElement>,
    /// Text after this element's end tag, up to the next sibling or the
    /// parent's end tag
    pub tail: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first direct child with the given tag name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Depth-first search for the first descendant with the given tag name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse an XML document and return its root element.
pub fn import(path: &Path) -> Result<XmlElement, FormatError> {
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    parse(BufReader::new(file)).map_err(|e| FormatError::parse(FormatTag::Xml, path, e))
}

fn parse<R: std::io::BufRead>(source: R) -> Result<XmlElement, BoxError> {
    let mut reader = Reader::from_reader(source);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("closing tag without an open element")?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if !text.trim().is_empty() {
                    push_text(&mut stack, &text);
                }
            }
            Event::CData(data) => push_text(&mut stack, std::str::from_utf8(&data)?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name).into());
    }
    root.ok_or_else(|| "document has no root element".into())
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, BoxError> {
    let mut element = XmlElement::new(std::str::from_utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

// Text outside the root element is ignored.
fn push_text(stack: &mut [XmlElement], text: &str) {
    let Some(current) = stack.last_mut() else {
        return;
    };
    match current.children.last_mut() {
        Some(previous) => previous.tail.push_str(text),
        None => current.text.push_str(text),
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), BoxError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err("multiple root elements".into());
    }
    Ok(())
}

/// Write `<root><k>v</k>...</root>` preceded by an XML declaration.
///
/// Children are written in iteration order; text is escaped.
pub fn export<I, K, V>(root: &str, elements: I, path: &Path) -> Result<(), FormatError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
    let mut writer = Writer::new(BufWriter::new(file));

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        path,
    )?;
    write_event(&mut writer, Event::Start(BytesStart::new(root)), path)?;
    for (key, value) in elements {
        let key = key.as_ref();
        write_event(&mut writer, Event::Start(BytesStart::new(key)), path)?;
        write_event(&mut writer, Event::Text(BytesText::new(value.as_ref())), path)?;
        write_event(&mut writer, Event::End(BytesEnd::new(key)), path)?;
    }
    write_event(&mut writer, Event::End(BytesEnd::new(root)), path)?;

    writer
        .into_inner()
        .flush()
        .map_err(|e| FormatError::io(path, e))
}

fn write_event<W: Write>(
    writer: &mut Writer<W>,
    event: Event<'_>,
    path: &Path,
) -> Result<(), FormatError> {
    writer
        .write_event(event)
        .map_err(|e| FormatError::write(FormatTag::Xml, path, e))
}
