//! Minimal owned XML element tree built on `quick-xml`.
//!
//! The registry is small enough to hold in memory, and walking a tree is far
//! simpler than driving the parser through a state machine per element type.
//! Only what the registry parser needs is kept: element names, attributes,
//! the concatenated direct text of each element, and child elements.
//!
//! Documents carrying a `<!DOCTYPE ...>` are refused outright. The doctype is
//! the only place entity declarations and external subsets can live, so
//! refusing it means no entity is ever expanded. References to undeclared
//! entities (anything beyond the five predefined ones) fail to unescape.
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An XML element with its attributes, direct text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Direct text content, concatenated across the element's children.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

/// A failure to read the document as safe, well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at byte {position})")]
pub struct XmlError {
    /// Human-readable reason.
    pub message: String,
    /// Byte offset where the reader stopped.
    pub position: u64,
}

impl Element {
    /// Look up an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over direct children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given tag name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given tag name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

/// Parse `text` into an element tree rooted at the document element.
///
/// # Errors
///
/// Returns an error for malformed XML, a doctype declaration, an undeclared
/// entity reference, an empty document, or more than one root element.
pub fn parse(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text.trim_start());
    let fail = |reader: &Reader<&[u8]>, message: String| XmlError {
        message,
        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
    };

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| fail(&reader, e.to_string()))?;
        match event {
            Event::DocType(_) => {
                return Err(fail(
                    &reader,
                    "document type declarations are not allowed".to_string(),
                ));
            }
            Event::Start(start) => {
                let element = open_element(&start).map_err(|m| fail(&reader, m))?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start).map_err(|m| fail(&reader, m))?;
                attach(&mut stack, &mut root, element).map_err(|m| fail(&reader, m))?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(fail(&reader, "unbalanced closing tag".to_string()));
                };
                attach(&mut stack, &mut root, element).map_err(|m| fail(&reader, m))?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| fail(&reader, e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let text = std::str::from_utf8(&c).map_err(|e| fail(&reader, e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(text);
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(fail(&reader, "unexpected end of document".to_string()));
    }
    root.ok_or_else(|| fail(&reader, "document has no root element".to_string()))
}

/// Build an element (without children) from a start or empty tag.
fn open_element(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

/// Attach a finished element to its parent, or make it the document root.
fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(format!("unexpected second root element <{}>", element.name))
    }
}
