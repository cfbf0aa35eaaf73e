use super::Actions;
use crate::model::ManifestModel;
use crate::xml::{comment_text, XmlDocument, XmlElement, XmlNode};

/// Serialize `doc` with a provenance comment in front of every element.
///
/// Each comment names the element key followed by every recorded decision
/// for it, e.g. `<!-- activity#com.example.Main ADDED from main:5:9-8:20 -->`.
pub(crate) fn blame_document(doc: &XmlDocument, actions: &Actions, model: &ManifestModel) -> String {
    let root = annotate(doc.root(), actions, model);
    let xml = doc.with_root(root).to_xml();

    // The root comment goes between the declaration and the root element
    let comment = format!("<!--{}-->\n", comment_text(&provenance(doc.root(), actions, model)));
    match xml.find('\n') {
        Some(end) => format!("{}{}{}", &xml[..=end], comment, &xml[end + 1..]),
        None => format!("{}{}", comment, xml),
    }
}

fn annotate(element: &XmlElement, actions: &Actions, model: &ManifestModel) -> XmlElement {
    let mut annotated = element.shell();
    annotated.attributes = element.attributes.clone();
    for child in &element.children {
        match child {
            XmlNode::Element(child) => {
                annotated
                    .children
                    .push(XmlNode::Comment(provenance(child, actions, model)));
                annotated.push_child(annotate(child, actions, model));
            }
            other => annotated.children.push(other.clone()),
        }
    }
    annotated
}

fn provenance(element: &XmlElement, actions: &Actions, model: &ManifestModel) -> String {
    let key = model.key(element).to_string();
    let mut text = format!(" {}", key);
    for record in actions.node_records(&key) {
        text.push_str(&format!("\n        {} from {}", record.action_type, record.position));
    }
    for attribute in actions.recorded_attributes(&key) {
        for record in actions.attribute_records(&key, attribute) {
            text.push_str(&format!(
                "\n        {} {} from {}",
                attribute, record.action_type, record.position
            ));
        }
    }
    text.push(' ');
    text
}
