use super::{NamespaceTable, QName, XmlDocument, XmlElement, XmlNode};
use quick_xml::escape::escape;

const INDENT: &str = "    ";

/// Serialize a document.
///
/// Output is byte-stable: namespace declarations are hoisted to the root in
/// a fixed order, attributes keep merge order and indentation is fixed.
pub fn write_document(document: &XmlDocument) -> String {
    let mut namespaces = document.namespaces().clone();
    collect_used_namespaces(document.root(), &mut namespaces);

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    write_element(&mut out, document.root(), &namespaces, 0, true);
    out
}

/// Make `text` legal comment content: no `--` anywhere and no trailing `-`.
pub(crate) fn comment_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(c);
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

fn collect_used_namespaces(element: &XmlElement, namespaces: &mut NamespaceTable) {
    if let Some(uri) = &element.name.namespace {
        namespaces.ensure(uri);
    }
    for attribute in &element.attributes {
        if let Some(uri) = &attribute.name.namespace {
            namespaces.ensure(uri);
        }
    }
    for child in element.child_elements() {
        collect_used_namespaces(child, namespaces);
    }
}

fn qualified(name: &QName, namespaces: &NamespaceTable) -> String {
    match name
        .namespace
        .as_deref()
        .and_then(|uri| namespaces.prefix_for(uri))
    {
        Some("") | None => name.local.clone(),
        Some(prefix) => format!("{}:{}", prefix, name.local),
    }
}

fn write_element(out: &mut String, element: &XmlElement, namespaces: &NamespaceTable, depth: usize, is_root: bool) {
    let indent = INDENT.repeat(depth);
    let tag = qualified(&element.name, namespaces);

    out.push_str(&indent);
    out.push('<');
    out.push_str(&tag);

    if is_root {
        for (prefix, uri) in namespaces.sorted() {
            if prefix.is_empty() {
                out.push_str(&format!(" xmlns=\"{}\"", escape(uri)));
            } else {
                out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri)));
            }
        }
    }
    for attribute in &element.attributes {
        out.push_str(&format!(
            " {}=\"{}\"",
            qualified(&attribute.name, namespaces),
            escape(attribute.value.as_str())
        ));
    }

    if element.children.is_empty() {
        out.push_str(" />\n");
        return;
    }

    if let [XmlNode::Text(text)] = element.children.as_slice() {
        out.push_str(&format!(">{}</{}>\n", escape(text.as_str()), tag));
        return;
    }

    out.push_str(">\n");
    let child_indent = INDENT.repeat(depth + 1);
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(out, child, namespaces, depth + 1, false),
            XmlNode::Comment(text) => out.push_str(&format!("{}<!--{}-->\n", child_indent, comment_text(text))),
            XmlNode::Text(text) => out.push_str(&format!("{}{}\n", child_indent, escape(text.as_str()))),
        }
    }
    out.push_str(&format!("{}</{}>\n", indent, tag));
}
