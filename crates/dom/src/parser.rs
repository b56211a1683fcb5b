//! Builds a [`Document`] from XML text by driving a `quick-xml` event reader.
//!
//! The reader runs with text trimming disabled so that indentation, comments
//! and processing instructions survive a parse/serialize round trip.

use crate::error::{DomError, Location};
use crate::name::{QualifiedName, XML_NAMESPACE, XMLNS_NAMESPACE};
use crate::tree::{Attribute, Document, Element, NodeId, NodeKind, XmlDeclaration};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use std::borrow::Cow;

/// Parses XML text into a mutable document.
///
/// Fails on anything that is not a single well-formed, namespace-well-formed
/// document: unclosed or mismatched tags, illegal characters, unknown entities,
/// duplicate attributes, undeclared prefixes, content outside the root element.
pub fn parse(text: &str) -> Result<Document, DomError> {
    let source = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut builder = TreeBuilder::new(source);
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    loop {
        let pos = reader.buffer_position() as usize;
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                let at = reader.error_position() as usize;
                return Err(DomError::malformed(e.to_string(), builder.location(at)));
            }
        };
        match event {
            XmlEvent::Start(e) => builder.start_element(&e, pos)?,
            XmlEvent::Empty(e) => {
                builder.start_element(&e, pos)?;
                builder.end_element(true);
            }
            XmlEvent::End(_) => builder.end_element(false),
            XmlEvent::Text(e) => {
                let raw = std::str::from_utf8(e.as_ref())?;
                let text = unescape(raw)
                    .map_err(|err| DomError::malformed(err.to_string(), builder.location(pos)))?;
                builder.text(&text, pos)?;
            }
            XmlEvent::GeneralRef(e) => {
                let name = std::str::from_utf8(e.as_ref())?;
                let reference = format!("&{};", name);
                let resolved = unescape(&reference).map_err(|err| {
                    DomError::malformed(
                        format!("cannot resolve entity '{}': {}", reference, err),
                        builder.location(pos),
                    )
                })?;
                builder.text(&resolved, pos)?;
            }
            XmlEvent::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                builder.leaf(NodeKind::CData(text.to_string()), pos)?;
            }
            XmlEvent::Comment(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                builder.leaf(NodeKind::Comment(text.to_string()), pos)?;
            }
            XmlEvent::PI(e) => {
                let raw = std::str::from_utf8(e.as_ref())?;
                let (target, data) = split_processing_instruction(raw);
                builder.leaf(
                    NodeKind::ProcessingInstruction {
                        target: target.to_string(),
                        data: data.to_string(),
                    },
                    pos,
                )?;
            }
            XmlEvent::DocType(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                builder.leaf(NodeKind::DocType(text.trim().to_string()), pos)?;
            }
            XmlEvent::Decl(e) => {
                if pos != 0 {
                    return Err(DomError::malformed(
                        "XML declaration is only allowed at the start of the document",
                        builder.location(pos),
                    ));
                }
                let location = builder.location(pos);
                let version = e
                    .version()
                    .map_err(|err| DomError::malformed(err.to_string(), location))?;
                let encoding = match e.encoding() {
                    Some(value) => Some(decl_value(
                        value.map_err(|err| DomError::malformed(err.to_string(), location))?,
                    )?),
                    None => None,
                };
                let standalone = match e.standalone() {
                    Some(value) => Some(decl_value(
                        value.map_err(|err| DomError::malformed(err.to_string(), location))?,
                    )?),
                    None => None,
                };
                builder.doc.set_declaration(Some(XmlDeclaration {
                    version: decl_value(version)?,
                    encoding,
                    standalone,
                }));
            }
            XmlEvent::Eof => break,
            #[allow(unreachable_patterns)]
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

fn decl_value(value: Cow<'_, [u8]>) -> Result<String, DomError> {
    Ok(std::str::from_utf8(&value)?.to_string())
}

fn split_processing_instruction(raw: &str) -> (&str, &str) {
    match raw.find(|c: char| c.is_ascii_whitespace()) {
        Some(split) => (&raw[..split], raw[split..].trim_start()),
        None => (raw, ""),
    }
}

/// Characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

type NamespaceScope = Vec<(Option<String>, String)>;

struct TreeBuilder<'s> {
    source: &'s str,
    doc: Document,
    open: Vec<NodeId>,
    scopes: Vec<NamespaceScope>,
    seen_root: bool,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            doc: Document::new(),
            open: Vec::new(),
            scopes: Vec::new(),
            seen_root: false,
        }
    }

    fn location(&self, pos: usize) -> Location {
        Location::from_offset(self.source, pos)
    }

    fn current_parent(&self) -> NodeId {
        self.open
            .last()
            .copied()
            .unwrap_or_else(|| self.doc.document_node())
    }

    fn check_chars(&self, text: &str, pos: usize) -> Result<(), DomError> {
        match text.chars().find(|&c| !is_xml_char(c)) {
            Some(bad) => Err(DomError::malformed(
                format!("invalid character U+{:04X}", bad as u32),
                self.location(pos),
            )),
            None => Ok(()),
        }
    }

    fn attach(&mut self, node: NodeId, pos: usize) -> Result<(), DomError> {
        let parent = self.current_parent();
        self.doc
            .append_child(parent, node)
            .map_err(|e| DomError::malformed(e.to_string(), self.location(pos)))
    }

    fn resolve(&self, prefix: Option<&str>, pos: usize) -> Result<Option<String>, DomError> {
        match prefix {
            Some("xml") => return Ok(Some(XML_NAMESPACE.to_string())),
            Some("xmlns") => return Ok(Some(XMLNS_NAMESPACE.to_string())),
            _ => {}
        }
        for scope in self.scopes.iter().rev() {
            if let Some((_, uri)) = scope.iter().find(|(p, _)| p.as_deref() == prefix) {
                return Ok((!uri.is_empty()).then(|| uri.clone()));
            }
        }
        match prefix {
            None => Ok(None),
            Some(p) => Err(DomError::UnboundPrefix {
                prefix: p.to_string(),
                location: self.location(pos),
            }),
        }
    }

    fn start_element(&mut self, e: &BytesStart, pos: usize) -> Result<(), DomError> {
        if self.open.is_empty() {
            if self.seen_root {
                return Err(DomError::malformed(
                    "content after the root element",
                    self.location(pos),
                ));
            }
            self.seen_root = true;
        }

        let location = self.location(pos);
        let tag = std::str::from_utf8(e.name().as_ref())?.to_string();

        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| DomError::malformed(err.to_string(), location))?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let raw_value = std::str::from_utf8(&attr.value)?;
            if raw_value.contains('<') {
                return Err(DomError::malformed(
                    format!("'<' is not allowed in the value of attribute '{}'", key),
                    location,
                ));
            }
            let value = unescape(&normalize_attribute_whitespace(raw_value))
                .map_err(|err| DomError::malformed(err.to_string(), location))?
                .into_owned();
            self.check_chars(&value, pos)?;
            raw_attributes.push((QualifiedName::from_lexical(&key), value));
        }

        // Declarations on this element are in scope for its own name and attributes.
        let mut scope = NamespaceScope::new();
        for (name, value) in &raw_attributes {
            match name.declared_prefix() {
                Some(Some(prefix)) => {
                    if value.is_empty() {
                        return Err(DomError::malformed(
                            format!("namespace prefix '{}' cannot be undeclared", prefix),
                            location,
                        ));
                    }
                    scope.push((Some(prefix.to_string()), value.clone()));
                }
                Some(None) => scope.push((None, value.clone())),
                None => {}
            }
        }
        self.scopes.push(scope);

        let mut name = QualifiedName::from_lexical(&tag);
        name.namespace = self.resolve(name.prefix.as_deref(), pos)?;

        let mut element = Element::new(name);
        for (mut attr_name, value) in raw_attributes {
            attr_name.namespace = if attr_name.is_namespace_declaration() {
                Some(XMLNS_NAMESPACE.to_string())
            } else if attr_name.prefix.is_some() {
                self.resolve(attr_name.prefix.as_deref(), pos)?
            } else {
                None
            };
            if element
                .attributes
                .iter()
                .any(|existing| existing.name.same_name(&attr_name))
            {
                return Err(DomError::DuplicateAttribute {
                    name: attr_name.to_string(),
                    location,
                });
            }
            element.attributes.push(Attribute::new(attr_name, value));
        }

        let node = self.doc.create_element(element);
        self.attach(node, pos)?;
        self.open.push(node);
        Ok(())
    }

    fn end_element(&mut self, self_closing: bool) {
        if let Some(node) = self.open.pop() {
            if let Some(element) = self.doc.element_mut(node) {
                element.self_closing = self_closing;
            }
        }
        self.scopes.pop();
    }

    fn text(&mut self, text: &str, pos: usize) -> Result<(), DomError> {
        self.check_chars(text, pos)?;
        if self.open.is_empty() && !text.chars().all(|c| c.is_ascii_whitespace()) {
            return Err(DomError::malformed(
                "text is not allowed outside the root element",
                self.location(pos),
            ));
        }
        let parent = self.current_parent();
        // Entity references split text into several events; keep one text node.
        if let Some(&last) = self.doc.children(parent).last() {
            if let NodeKind::Text(existing) = self.doc.kind_mut(last) {
                existing.push_str(text);
                return Ok(());
            }
        }
        let node = self.doc.create_text(text);
        self.attach(node, pos)
    }

    fn leaf(&mut self, kind: NodeKind, pos: usize) -> Result<(), DomError> {
        match &kind {
            NodeKind::CData(_) if self.open.is_empty() => {
                return Err(DomError::malformed(
                    "CDATA is not allowed outside the root element",
                    self.location(pos),
                ));
            }
            NodeKind::DocType(_) if self.seen_root => {
                return Err(DomError::malformed(
                    "DOCTYPE must precede the root element",
                    self.location(pos),
                ));
            }
            NodeKind::CData(text) | NodeKind::Comment(text) => self.check_chars(text, pos)?,
            _ => {}
        }
        let node = self.doc.create_node(kind);
        self.attach(node, pos)
    }

    fn finish(self) -> Result<Document, DomError> {
        if let Some(&open) = self.open.last() {
            let name = self
                .doc
                .element(open)
                .map(|e| e.name.to_string())
                .unwrap_or_default();
            return Err(DomError::malformed(
                format!("unclosed element <{}>", name),
                self.location(self.source.len()),
            ));
        }
        if !self.seen_root {
            return Err(DomError::MissingRoot);
        }
        log::debug!(
            "Parsed document with {} top-level nodes",
            self.doc.children(self.doc.document_node()).len()
        );
        Ok(self.doc)
    }
}

/// Literal tabs and line breaks in an attribute value read as spaces. Character
/// references such as `&#10;` are resolved afterwards and keep their meaning.
fn normalize_attribute_whitespace(raw: &str) -> Cow<'_, str> {
    if raw.contains(['\t', '\n', '\r']) {
        Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(raw)
    }
}
