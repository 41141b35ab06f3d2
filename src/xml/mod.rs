//! Generic XML element tree.
//!
//! Documents are decoded into an owned [`XmlElement`] tree with quick-xml's
//! pull parser. Element and attribute names are stored by local name, so a
//! default namespace (as in UniProt exports) does not leak into lookups.

mod path;

pub use path::XmlPath;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, XmlGraphError};

/// One element of a decoded document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local element name
    pub name: String,
    /// Attributes in document order (names are unique per element)
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data directly inside this element, trimmed
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Get an attribute value by local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// [`XmlElement::value_at`] for a fixed path written in code.
    ///
    /// A malformed path resolves to `None`, the same as an absent one.
    /// User-supplied paths go through [`XmlPath::parse`] so the error surfaces.
    pub(crate) fn value(&self, path: &str) -> Option<&str> {
        let path = XmlPath::parse(path).ok()?;
        self.value_at(&path)
    }

    /// Resolve a path relative to this element (first segment names a child).
    ///
    /// Returns the element text, or the attribute value when the path ends
    /// in `@attr`. The first matching child is taken at each step.
    pub fn value_at(&self, path: &XmlPath) -> Option<&str> {
        let mut current = self;
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        match path.attribute() {
            Some(attr) => current.attribute(attr),
            None => Some(current.text.as_str()),
        }
    }

    /// Every element reachable through the path, fanning out over
    /// repeated children at each step.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut frontier = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            frontier = frontier
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.name == segment))
                .collect();
        }
        frontier
    }

    /// List every addressable path below and including this element with its value.
    ///
    /// Repeated siblings are listed once per occurrence; lookups always pick
    /// the first one.
    pub fn paths(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.collect_paths(&self.name, &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        if !self.text.is_empty() || self.children.is_empty() {
            out.push((prefix.to_string(), self.text.clone()));
        }
        for (key, value) in &self.attributes {
            out.push((format!("{}/@{}", prefix, key), value.clone()));
        }
        for child in &self.children {
            child.collect_paths(&format!("{}/{}", prefix, child.name), out);
        }
    }
}

/// A decoded document: its single root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    /// Resolve an absolute path whose first segment is the root element name
    pub fn lookup(&self, path: &XmlPath) -> Option<&str> {
        let relative = path.strip_root(&self.root.name)?;
        self.root.value_at(&relative)
    }

    /// Every element matching an absolute path
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match segments.next() {
            Some(first) if first == self.root.name => {
                let rest: Vec<&str> = segments.collect();
                self.root.find_all(&rest.join("/"))
            }
            _ => Vec::new(),
        }
    }
}

/// Parse XML text into a document tree.
///
/// Fails on mismatched or unclosed tags, a missing root element, a second
/// root element, or character data outside the root.
pub fn parse_document(content: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            XmlGraphError::Xml(format!("at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(e) => {
                ensure_single_root(&root, &stack)?;
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                ensure_single_root(&root, &stack)?;
                let element = element_from_start(&e)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlGraphError::Xml("unexpected closing tag".to_string()))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                push_text(&mut stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_reference(&name)
                    .ok_or_else(|| XmlGraphError::Xml(format!("unknown entity &{};", name)))?;
                push_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlGraphError::Xml(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    root.map(|root| XmlDocument { root })
        .ok_or_else(|| XmlGraphError::Xml("document has no root element".to_string()))
}

fn ensure_single_root(root: &Option<XmlElement>, stack: &[XmlElement]) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        return Err(XmlGraphError::Xml(
            "content after the root element".to_string(),
        ));
    }
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut attributes: Vec<(String, String)> = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlGraphError::Xml(format!("in <{}>: {}", name, e)))?;
        let key = attr.key;
        // Namespace declarations are not data
        if key.as_namespace_binding().is_some() {
            continue;
        }
        let local = String::from_utf8_lossy(key.local_name().as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlGraphError::Xml(format!("in <{}>: {}", name, e)))?
            .to_string();
        attributes.push((local, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn close_element(mut element: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    element.text = element.text.trim().to_string();
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(XmlGraphError::Xml(format!(
                "text outside the root element: {:?}",
                text.trim()
            )))
        }
    }
    Ok(())
}

/// Resolve the body of a `&...;` reference: the five predefined entities
/// and numeric character references.
fn resolve_reference(name: &str) -> Option<String> {
    let resolved = match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some(resolved.to_string())
}
