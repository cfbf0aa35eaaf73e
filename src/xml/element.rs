use super::{
    DocumentType, NamespaceTable, SourceFile, SourceFilePosition, SourceSpan, ANDROID_URI,
    DIST_URI, TOOLS_URI,
};
use crate::model::{AttributeOperation, NodeOperation, NodeType};
use std::fmt;
use std::sync::Arc;

/// Namespace-qualified name of an element or attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.into(),
        }
    }

    pub fn local(local: impl Into<String>) -> Self {
        Self::new(None, local)
    }

    pub fn android(local: impl Into<String>) -> Self {
        Self::new(Some(ANDROID_URI), local)
    }

    pub fn tools(local: impl Into<String>) -> Self {
        Self::new(Some(TOOLS_URI), local)
    }

    pub fn in_namespace(&self, uri: &str) -> bool {
        self.namespace.as_deref() == Some(uri)
    }

    pub fn is_tools(&self) -> bool {
        self.in_namespace(TOOLS_URI)
    }

    pub fn is_android(&self, local: &str) -> bool {
        self.in_namespace(ANDROID_URI) && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace.as_deref() {
            None => write!(f, "{}", self.local),
            Some(ANDROID_URI) => write!(f, "android:{}", self.local),
            Some(TOOLS_URI) => write!(f, "tools:{}", self.local),
            Some(DIST_URI) => write!(f, "dist:{}", self.local),
            Some(uri) => write!(f, "{{{}}}{}", uri, self.local),
        }
    }
}

/// Provenance shared by every node loaded from the same document
#[derive(Debug, PartialEq)]
pub struct Origin {
    pub file: Arc<SourceFile>,
    pub doc_type: DocumentType,
    /// Package used to qualify relative class names of this document
    pub package: Option<String>,
    /// Prefix bindings of the source text, for resolving directive values
    pub namespaces: NamespaceTable,
}

impl Origin {
    pub fn new(
        file: Arc<SourceFile>,
        doc_type: DocumentType,
        package: Option<String>,
        namespaces: NamespaceTable,
    ) -> Self {
        Self {
            file,
            doc_type,
            package,
            namespaces,
        }
    }

    pub fn is_library(&self) -> bool {
        self.doc_type == DocumentType::Library
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    pub(crate) name: QName,
    pub(crate) value: String,
    pub(crate) origin: Arc<Origin>,
    pub(crate) span: Option<SourceSpan>,
}

impl XmlAttribute {
    pub fn new(name: QName, value: impl Into<String>, origin: Arc<Origin>, span: Option<SourceSpan>) -> Self {
        Self {
            name,
            value: value.into(),
            origin,
            span,
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn origin(&self) -> &Arc<Origin> {
        &self.origin
    }

    pub fn position(&self) -> SourceFilePosition {
        SourceFilePosition::new(self.origin.file.clone(), self.span)
    }

    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Comment(String),
    Text(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub(crate) name: QName,
    pub(crate) node_type: NodeType,
    pub(crate) attributes: Vec<XmlAttribute>,
    pub(crate) children: Vec<XmlNode>,
    pub(crate) span: Option<SourceSpan>,
    pub(crate) origin: Arc<Origin>,
}

impl XmlElement {
    pub fn new(name: QName, node_type: NodeType, origin: Arc<Origin>) -> Self {
        Self {
            name,
            node_type,
            attributes: Vec::new(),
            children: Vec::new(),
            span: None,
            origin,
        }
    }

    /// Copy of this element without attributes or children
    pub(crate) fn shell(&self) -> Self {
        Self {
            name: self.name.clone(),
            node_type: self.node_type,
            attributes: Vec::new(),
            children: Vec::new(),
            span: self.span,
            origin: self.origin.clone(),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    pub fn origin(&self) -> &Arc<Origin> {
        &self.origin
    }

    pub fn position(&self) -> SourceFilePosition {
        SourceFilePosition::new(self.origin.file.clone(), self.span)
    }

    pub fn attribute(&self, name: &QName) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| &a.name == name)
    }

    pub fn attribute_value(&self, name: &QName) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_str())
    }

    pub fn android_attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is_android(local))
            .map(|a| a.value.as_str())
    }

    pub fn tools_attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is_tools() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn children_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &XmlElement> {
        self.child_elements().filter(move |c| c.node_type == node_type)
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Comment(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Replace an attribute with the same name, or append it
    pub(crate) fn set_attribute(&mut self, attribute: XmlAttribute) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub(crate) fn remove_attribute(&mut self, name: &QName) -> Option<XmlAttribute> {
        let index = self.attributes.iter().position(|a| &a.name == name)?;
        Some(self.attributes.remove(index))
    }

    pub(crate) fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub(crate) fn child_of_type_mut(&mut self, node_type: NodeType) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|c| match c {
            XmlNode::Element(e) if e.node_type == node_type => Some(e),
            _ => None,
        })
    }

    /// Parsed `tools:node` value; `Err` carries the invalid text
    pub fn node_operation(&self) -> Result<Option<NodeOperation>, String> {
        match self.tools_attribute("node") {
            Some(value) => value.parse().map(Some),
            None => Ok(None),
        }
    }

    /// Whether `tools:node` is `remove` or `removeAll`
    pub fn is_removal_marker(&self) -> bool {
        matches!(
            self.node_operation(),
            Ok(Some(NodeOperation::Remove | NodeOperation::RemoveAll))
        )
    }

    /// Attribute names listed by `tools:replace`, `tools:remove` or `tools:strict`.
    ///
    /// Unprefixed names live in the android namespace.
    pub fn attribute_operation_targets(&self, operation: AttributeOperation) -> Vec<QName> {
        let Some(value) = self.tools_attribute(operation.tools_name()) else {
            return Vec::new();
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| match name.split_once(':') {
                Some((prefix, local)) => {
                    let uri = self
                        .origin
                        .namespaces
                        .uri_for(prefix)
                        .unwrap_or(if prefix == "android" { ANDROID_URI } else { prefix });
                    QName::new(Some(uri), local)
                }
                None => QName::android(name),
            })
            .collect()
    }

    /// Library package named by `tools:selector`
    pub fn selector(&self) -> Option<&str> {
        self.tools_attribute("selector")
    }

    /// Dynamic feature names listed by `tools:requireFeature`
    pub fn required_features(&self) -> Vec<&str> {
        self.tools_attribute("requireFeature")
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Number of elements in this subtree, this one included
    pub fn element_count(&self) -> usize {
        1 + self.child_elements().map(XmlElement::element_count).sum::<usize>()
    }
}
