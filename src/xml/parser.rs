use super::{
    DocumentType, LineIndex, NamespaceTable, Origin, QName, SourceFile, XmlAttribute, XmlDocument,
    XmlElement, XmlNode,
};
use crate::error::MergeFailure;
use crate::model::{ManifestModel, NodeType};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::sync::Arc;
use tracing::debug;

const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Element as read from the text, before namespace resolution
struct RawElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<RawNode>,
    start: usize,
    end: usize,
}

enum RawNode {
    Element(RawElement),
    Comment(String),
    Text(String),
}

/// Parse manifest text into a document.
///
/// `package` is the package that qualifies relative class names of this
/// document; it defaults to the declared `package` attribute.
pub fn parse_document(
    text: &str,
    file: Arc<SourceFile>,
    doc_type: DocumentType,
    package: Option<&str>,
    model: &ManifestModel,
) -> Result<XmlDocument, MergeFailure> {
    let index = LineIndex::new(text);
    let raw = read_tree(text, &file, &index)?;

    let mut namespaces = NamespaceTable::new();
    collect_namespaces(&raw, &mut namespaces);

    let package = package.map(str::to_string).or_else(|| {
        raw.attributes
            .iter()
            .find(|(name, _)| name == "package")
            .map(|(_, value)| value.clone())
    });

    let origin = Arc::new(Origin::new(file.clone(), doc_type, package, namespaces.clone()));
    let builder = TreeBuilder {
        file: &file,
        index: &index,
        origin,
        model,
    };
    let mut scope = Vec::new();
    let root = builder.build(raw, None, &mut scope)?;

    debug!(
        "Parsed {} manifest {}: {} elements",
        doc_type,
        file,
        root.element_count()
    );

    Ok(XmlDocument::new(file, doc_type, root, namespaces))
}

fn read_tree(text: &str, file: &SourceFile, index: &LineIndex) -> Result<RawElement, MergeFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;

    loop {
        let start = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(file, index, reader.buffer_position(), e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                let element = open_element(e, start)
                    .map_err(|message| parse_error(file, index, start, message))?;
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let mut element = open_element(e, start)
                    .map_err(|message| parse_error(file, index, start, message))?;
                element.end = reader.buffer_position();
                attach(&mut stack, &mut root, element)
                    .map_err(|message| parse_error(file, index, start, message))?;
            }
            Event::End(ref e) => {
                let mut element = stack.pop().ok_or_else(|| {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    parse_error(file, index, start, format!("Unexpected closing tag </{}>", name))
                })?;
                element.end = reader.buffer_position();
                attach(&mut stack, &mut root, element)
                    .map_err(|message| parse_error(file, index, start, message))?;
            }
            Event::Comment(ref c) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(RawNode::Comment(String::from_utf8_lossy(c).to_string()));
                }
            }
            Event::Text(ref t) => {
                let value = t
                    .unescape()
                    .map_err(|e| parse_error(file, index, start, e.to_string()))?;
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(RawNode::Text(trimmed.to_string())),
                        None => {
                            return Err(parse_error(
                                file,
                                index,
                                start,
                                "Content is not allowed outside the root element",
                            ))
                        }
                    }
                }
            }
            Event::CData(ref c) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(RawNode::Text(String::from_utf8_lossy(c).to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(
            file,
            index,
            text.len(),
            format!("XML document structures must start and end within the same entity: <{}> is not closed", open.name),
        ));
    }

    root.ok_or_else(|| parse_error(file, index, 0, "Premature end of file: no root element"))
}

fn open_element(e: &BytesStart<'_>, start: usize) -> Result<RawElement, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.to_string();
        attributes.push((key, value));
    }
    Ok(RawElement {
        name,
        attributes,
        children: Vec::new(),
        start,
        end: start,
    })
}

fn attach(stack: &mut [RawElement], root: &mut Option<RawElement>, element: RawElement) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(RawNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(format!(
            "The markup in the document following the root element must be well-formed: <{}>",
            element.name
        ));
    }
    *root = Some(element);
    Ok(())
}

fn collect_namespaces(element: &RawElement, table: &mut NamespaceTable) {
    for (name, value) in &element.attributes {
        if let Some(prefix) = declared_prefix(name) {
            table.declare(prefix, value.as_str());
        }
    }
    for child in &element.children {
        if let RawNode::Element(child) = child {
            collect_namespaces(child, table);
        }
    }
}

/// Prefix bound by an `xmlns` attribute; the default namespace is ""
fn declared_prefix(attribute: &str) -> Option<&str> {
    if attribute == "xmlns" {
        Some("")
    } else {
        attribute.strip_prefix("xmlns:")
    }
}

fn parse_error(file: &SourceFile, index: &LineIndex, offset: usize, message: impl Into<String>) -> MergeFailure {
    let (line, column) = index.position(offset);
    MergeFailure::Parse {
        file: file.to_string(),
        line,
        column,
        message: message.into(),
    }
}

struct TreeBuilder<'a> {
    file: &'a SourceFile,
    index: &'a LineIndex,
    origin: Arc<Origin>,
    model: &'a ManifestModel,
}

impl TreeBuilder<'_> {
    fn build(
        &self,
        raw: RawElement,
        parent: Option<NodeType>,
        scope: &mut Vec<(String, String)>,
    ) -> Result<XmlElement, MergeFailure> {
        let scope_len = scope.len();
        for (name, value) in &raw.attributes {
            if let Some(prefix) = declared_prefix(name) {
                scope.push((prefix.to_string(), value.clone()));
            }
        }

        let name = self.resolve(&raw.name, true, scope, raw.start)?;
        let node_type = self.model.node_type(&name, parent);
        let span = Some(self.index.span(raw.start, raw.end));

        let mut element = XmlElement::new(name, node_type, self.origin.clone());
        element.span = span;

        for (attr_name, value) in raw.attributes {
            if declared_prefix(&attr_name).is_some() {
                continue;
            }
            let qname = self.resolve(&attr_name, false, scope, raw.start)?;
            element
                .attributes
                .push(XmlAttribute::new(qname, value, self.origin.clone(), span));
        }

        for child in raw.children {
            let node = match child {
                RawNode::Element(child) => XmlNode::Element(self.build(child, Some(node_type), scope)?),
                RawNode::Comment(text) => XmlNode::Comment(text),
                RawNode::Text(text) => XmlNode::Text(text),
            };
            element.children.push(node);
        }

        scope.truncate(scope_len);
        Ok(element)
    }

    /// Resolve a raw `prefix:local` name against the declarations in scope
    fn resolve(
        &self,
        raw: &str,
        is_element: bool,
        scope: &[(String, String)],
        offset: usize,
    ) -> Result<QName, MergeFailure> {
        let lookup = |prefix: &str| {
            scope
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
        };

        match raw.split_once(':') {
            Some(("xml", local)) => Ok(QName::new(Some(XML_URI), local)),
            Some((prefix, local)) => match lookup(prefix) {
                Some(uri) => Ok(QName::new(Some(uri), local)),
                None => Err(parse_error(
                    self.file,
                    self.index,
                    offset,
                    format!("The prefix \"{}\" for \"{}\" is not bound.", prefix, raw),
                )),
            },
            None if is_element => Ok(QName::new(lookup("").filter(|uri| !uri.is_empty()), raw)),
            None => Ok(QName::local(raw)),
        }
    }
}
