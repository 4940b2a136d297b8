//! The settings document as a generic attributed-element tree.
//!
//! The hosting environment's settings file (`web.config`) is user-owned:
//! the pipeline must upsert a handful of well-known entries while leaving
//! every unrelated section, entry, comment, and attribute exactly where the
//! author put it. Modeling the document as a generic tree (tag, attributes,
//! ordered children) instead of a typed configuration object is what makes
//! that round-trip possible. Parsing goes through `quick-xml`; writing is a
//! direct walk of the tree so empty elements keep the conventional
//! `<add ... />` form.

use crate::error::PackError;
use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Element name of the section holding the well-known entries.
pub const APP_SETTINGS: &str = "appSettings";

const ROOT_ELEMENT: &str = "configuration";
const ENTRY_ELEMENT: &str = "add";
const KEY_ATTR: &str = "key";
const VALUE_ATTR: &str = "value";

/// An element: tag name, ordered attributes, ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
    /// Whether the element was written in self-closing form.
    pub self_closing: bool,
}

impl XmlElement {
    /// A new childless element.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// The value of the named attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing the value in place when the attribute
    /// already exists (its position and every other attribute are kept).
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }
}

/// Any node that can appear in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Character data, unescaped. Whitespace between elements lands here.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment, verbatim.
    Comment(String),
    /// A processing instruction, verbatim.
    ProcessingInstruction(String),
    /// A doctype declaration, verbatim.
    DocType(String),
    /// The XML declaration.
    Decl {
        /// `version` pseudo-attribute.
        version: String,
        /// `encoding` pseudo-attribute, if present.
        encoding: Option<String>,
        /// `standalone` pseudo-attribute, if present.
        standalone: Option<String>,
    },
}

/// A whole document: what precedes the root, the root, what follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    /// Declaration, comments, and whitespace before the root element.
    pub prolog: Vec<XmlNode>,
    /// The root element, if the document has one.
    pub root: Option<XmlElement>,
    /// Comments and whitespace after the root element.
    pub trailing: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a document from text.
    ///
    /// # Errors
    ///
    /// Returns the parser diagnostic when the text is not well-formed.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(text);
        let mut document = Self::default();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| e.to_string())?;
            match event {
                Event::Eof => break,
                Event::Start(start) => stack.push(element_from(&start, false)?),
                Event::Empty(start) => {
                    let element = element_from(&start, true)?;
                    attach(&mut document, &mut stack, XmlNode::Element(element));
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or("unexpected closing tag")?;
                    attach(&mut document, &mut stack, XmlNode::Element(element));
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| e.to_string())?.into_owned();
                    attach(&mut document, &mut stack, XmlNode::Text(text));
                }
                Event::CData(data) => {
                    let data = String::from_utf8_lossy(&data).into_owned();
                    attach(&mut document, &mut stack, XmlNode::CData(data));
                }
                Event::Comment(comment) => {
                    let comment = String::from_utf8_lossy(&comment).into_owned();
                    attach(&mut document, &mut stack, XmlNode::Comment(comment));
                }
                Event::PI(pi) => {
                    let pi = String::from_utf8_lossy(&pi).into_owned();
                    attach(&mut document, &mut stack, XmlNode::ProcessingInstruction(pi));
                }
                Event::DocType(doctype) => {
                    let doctype = String::from_utf8_lossy(&doctype).into_owned();
                    attach(&mut document, &mut stack, XmlNode::DocType(doctype));
                }
                Event::Decl(decl) => {
                    let version = decl
                        .version()
                        .map_err(|e| e.to_string())
                        .map(|v| String::from_utf8_lossy(&v).into_owned())?;
                    let encoding = match decl.encoding() {
                        None => None,
                        Some(Ok(v)) => Some(String::from_utf8_lossy(&v).into_owned()),
                        Some(Err(e)) => return Err(e.to_string()),
                    };
                    let standalone = match decl.standalone() {
                        None => None,
                        Some(Ok(v)) => Some(String::from_utf8_lossy(&v).into_owned()),
                        Some(Err(e)) => return Err(e.to_string()),
                    };
                    attach(
                        &mut document,
                        &mut stack,
                        XmlNode::Decl {
                            version,
                            encoding,
                            standalone,
                        },
                    );
                }
            }
        }

        if stack.is_empty() {
            Ok(document)
        } else {
            Err("unclosed element".to_string())
        }
    }

    /// Serialize the document back to text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            write_node(&mut out, node);
        }
        if let Some(root) = &self.root {
            write_element(&mut out, root);
        }
        for node in &self.trailing {
            write_node(&mut out, node);
        }
        out
    }

    /// Upsert the well-known app-settings entries.
    ///
    /// Locates the app-settings section (creating it at the end of the root
    /// element when absent; creating the root itself for an empty
    /// document). For each `(key, value)` pair, an existing `add` entry
    /// with that key is updated in place - keeping its position and its
    /// other attributes - and a missing one is appended at the end of the
    /// section. Nothing else in the document is touched.
    pub fn upsert_app_settings(&mut self, entries: &[(&str, String)]) {
        let root = self
            .root
            .get_or_insert_with(|| XmlElement::new(ROOT_ELEMENT));

        let position = root
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.name == APP_SETTINGS));
        let position = position.unwrap_or_else(|| {
            root.children
                .push(XmlNode::Element(XmlElement::new(APP_SETTINGS)));
            root.children.len() - 1
        });
        let Some(XmlNode::Element(section)) = root.children.get_mut(position) else {
            return;
        };

        for (key, value) in entries {
            let existing = section.children.iter_mut().find_map(|n| match n {
                XmlNode::Element(e)
                    if e.name == ENTRY_ELEMENT && e.attribute(KEY_ATTR) == Some(key) =>
                {
                    Some(e)
                }
                _ => None,
            });
            match existing {
                Some(entry) => entry.set_attribute(VALUE_ATTR, value),
                None => {
                    let mut entry = XmlElement::new(ENTRY_ELEMENT);
                    entry.self_closing = true;
                    entry.set_attribute(KEY_ATTR, key);
                    entry.set_attribute(VALUE_ATTR, value);
                    section.children.push(XmlNode::Element(entry));
                }
            }
        }
    }

    /// A minimal document: declaration plus the app-settings section with
    /// the given entries.
    pub fn synthesize(entries: &[(&str, String)]) -> Self {
        let mut section = XmlElement::new(APP_SETTINGS);
        for (key, value) in entries {
            section.children.push(XmlNode::Text("\n    ".to_string()));
            let mut entry = XmlElement::new(ENTRY_ELEMENT);
            entry.self_closing = true;
            entry.set_attribute(KEY_ATTR, key);
            entry.set_attribute(VALUE_ATTR, value);
            section.children.push(XmlNode::Element(entry));
        }
        section.children.push(XmlNode::Text("\n  ".to_string()));

        let mut root = XmlElement::new(ROOT_ELEMENT);
        root.children.push(XmlNode::Text("\n  ".to_string()));
        root.children.push(XmlNode::Element(section));
        root.children.push(XmlNode::Text("\n".to_string()));

        Self {
            prolog: vec![
                XmlNode::Decl {
                    version: "1.0".to_string(),
                    encoding: Some("utf-8".to_string()),
                    standalone: None,
                },
                XmlNode::Text("\n".to_string()),
            ],
            root: Some(root),
            trailing: vec![XmlNode::Text("\n".to_string())],
        }
    }
}

/// Ensure the settings document at `path` exists and carries `entries`.
///
/// An existing document is parsed and merged in place; a missing one is
/// synthesized from scratch.
///
/// # Errors
///
/// [`PackError::DocumentMerge`] when an existing document is not
/// well-formed, [`PackError::FileSystem`] when it cannot be read or
/// written.
pub fn ensure_settings_document(path: &Path, entries: &[(&str, String)]) -> Result<(), PackError> {
    let mut document = if path.is_file() {
        let text = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        XmlDocument::parse(&text).map_err(|reason| PackError::DocumentMerge {
            path: path.to_path_buf(),
            reason,
        })?
    } else {
        XmlDocument::synthesize(&[])
    };

    document.upsert_app_settings(entries);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    std::fs::write(path, document.to_text()).map_err(|e| PackError::io(path, e))
}

fn element_from(start: &BytesStart<'_>, self_closing: bool) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        self_closing,
    })
}

/// Attach a finished node to the innermost open element, or to the
/// document itself when no element is open.
fn attach(document: &mut XmlDocument, stack: &mut Vec<XmlElement>, node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    match node {
        XmlNode::Element(element) if document.root.is_none() => document.root = Some(element),
        node if document.root.is_none() => document.prolog.push(node),
        node => document.trailing.push(node),
    }
}

fn write_element(out: &mut String, element: &XmlElement) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if element.self_closing && element.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_node(out: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Element(element) => write_element(out, element),
        XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNode::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        XmlNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        }
        XmlNode::DocType(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        XmlNode::Decl {
            version,
            encoding,
            standalone,
        } => {
            out.push_str("<?xml version=\"");
            out.push_str(version);
            out.push('"');
            if let Some(encoding) = encoding {
                out.push_str(" encoding=\"");
                out.push_str(encoding);
                out.push('"');
            }
            if let Some(standalone) = standalone {
                out.push_str(" standalone=\"");
                out.push_str(standalone);
                out.push('"');
            }
            out.push_str("?>");
        }
    }
}
