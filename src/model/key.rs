use super::{KeyResolver, NodeType};
use crate::xml::XmlElement;
use std::fmt;

/// Identity component of a [`NodeKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyId {
    /// At most one such node per parent; always unified
    Singleton,
    Value(String),
    /// No identity; never unified with anything
    Anonymous,
}

/// Merge identity of an element: its type plus a key value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    tag: String,
    node_type: NodeType,
    id: KeyId,
}

impl NodeKey {
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn value(&self) -> Option<&str> {
        match &self.id {
            KeyId::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unifiable(&self) -> bool {
        self.id != KeyId::Anonymous
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            KeyId::Value(value) => write!(f, "{}#{}", self.tag, value),
            _ => write!(f, "{}", self.tag),
        }
    }
}

pub(crate) fn compute_key(resolver: &KeyResolver, element: &XmlElement) -> NodeKey {
    let tag = match element.node_type() {
        NodeType::Custom | NodeType::DistElement => element.name().to_string(),
        other => other.tag_name().to_string(),
    };

    let id = match resolver {
        KeyResolver::Singleton => KeyId::Singleton,
        KeyResolver::None => KeyId::Anonymous,
        KeyResolver::Attribute(name) => element
            .android_attribute(name)
            .map(|v| KeyId::Value(v.to_string()))
            .unwrap_or(KeyId::Anonymous),
        KeyResolver::FirstOf(names) => names
            .iter()
            .find_map(|name| element.android_attribute(name))
            .map(|v| KeyId::Value(v.to_string()))
            .unwrap_or(KeyId::Anonymous),
        KeyResolver::Composite(names) => {
            let parts: Vec<&str> = names
                .iter()
                .filter_map(|name| element.android_attribute(name))
                .filter(|v| !v.is_empty())
                .collect();
            if parts.is_empty() {
                KeyId::Anonymous
            } else {
                KeyId::Value(parts.join("+"))
            }
        }
        KeyResolver::Content => KeyId::Value(content_signature(element)),
    };

    NodeKey {
        tag,
        node_type: element.node_type(),
        id,
    }
}

/// Order-insensitive description of a subtree, ignoring comments and tools directives
pub fn content_signature(element: &XmlElement) -> String {
    let mut parts: Vec<String> = element
        .attributes()
        .iter()
        .filter(|a| !a.name().is_tools())
        .map(|a| format!("{}={}", a.name(), a.value()))
        .collect();
    parts.extend(
        element
            .child_elements()
            .map(|child| format!("{}({})", child.name(), content_signature(child))),
    );
    parts.sort();
    parts.join("+")
}
