use super::{write_document, QName, SourceFile, XmlElement, ANDROID_URI, DIST_URI, TOOLS_URI};
use crate::error::MergeFailure;
use crate::model::{content_signature, ManifestModel, NodeType};
use std::fmt;
use std::sync::Arc;

/// Role a document plays in a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Main,
    Library,
    Overlay,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Main => "main",
            DocumentType::Library => "library",
            DocumentType::Overlay => "overlay",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered prefix to namespace-URI bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: Vec<(String, String)>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`. The first binding of a prefix wins.
    pub fn declare(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if self.uri_for(&prefix).is_none() {
            self.entries.push((prefix, uri.into()));
        }
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn remove_uri(&mut self, uri: &str) {
        self.entries.retain(|(_, u)| u != uri);
    }

    /// Make sure `uri` has a prefix, inventing one when needed
    pub fn ensure(&mut self, uri: &str) {
        if self.prefix_for(uri).is_some() {
            return;
        }
        let preferred = match uri {
            ANDROID_URI => "android",
            TOOLS_URI => "tools",
            DIST_URI => "dist",
            _ => "ns",
        };
        let prefix = self.free_prefix(preferred);
        self.entries.push((prefix, uri.to_string()));
    }

    /// Add the bindings of `other` whose URI is not bound yet
    pub fn absorb(&mut self, other: &NamespaceTable) {
        for (prefix, uri) in &other.entries {
            if self.prefix_for(uri).is_some() {
                continue;
            }
            let prefix = self.free_prefix(prefix);
            self.entries.push((prefix, uri.clone()));
        }
    }

    /// Declarations in output order: android first, then by prefix
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(prefix, _)| (*prefix != "android", prefix.to_string()));
        entries
    }

    fn free_prefix(&self, preferred: &str) -> String {
        if self.uri_for(preferred).is_none() {
            return preferred.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", preferred, n))
            .find(|candidate| self.uri_for(candidate).is_none())
            .unwrap_or_else(|| preferred.to_string())
    }
}

/// A parsed manifest document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: Arc<SourceFile>,
    doc_type: DocumentType,
    root: XmlElement,
    namespaces: NamespaceTable,
}

impl XmlDocument {
    pub fn new(
        source: Arc<SourceFile>,
        doc_type: DocumentType,
        root: XmlElement,
        namespaces: NamespaceTable,
    ) -> Self {
        Self {
            source,
            doc_type,
            root,
            namespaces,
        }
    }

    /// Parse `text` with the standard manifest model
    pub fn parse(text: &str, source: SourceFile, doc_type: DocumentType) -> Result<Self, MergeFailure> {
        super::parse_document(
            text,
            Arc::new(source),
            doc_type,
            None,
            &ManifestModel::new(),
        )
    }

    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// The `package` attribute declared on the root element
    pub fn package(&self) -> Option<&str> {
        self.root.attribute_value(&QName::local("package"))
    }

    /// Same metadata, different tree
    pub fn with_root(&self, root: XmlElement) -> Self {
        Self {
            source: self.source.clone(),
            doc_type: self.doc_type,
            root,
            namespaces: self.namespaces.clone(),
        }
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Every element of `node_type`, in document order
    pub fn elements_of_type(&self, node_type: NodeType) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        collect_of_type(&self.root, node_type, &mut found);
        found
    }

    /// First element of `node_type` whose key value is `key`
    pub fn find(&self, model: &ManifestModel, node_type: NodeType, key: Option<&str>) -> Option<&XmlElement> {
        self.elements_of_type(node_type)
            .into_iter()
            .find(|e| model.key(e).value() == key)
    }

    /// Compare two documents ignoring element order and comments
    pub fn same_content(&self, other: &XmlDocument) -> bool {
        self.root.name == other.root.name
            && content_signature(&self.root) == content_signature(&other.root)
    }

    pub fn to_xml(&self) -> String {
        write_document(self)
    }
}

fn collect_of_type<'a>(element: &'a XmlElement, node_type: NodeType, found: &mut Vec<&'a XmlElement>) {
    if element.node_type == node_type {
        found.push(element);
    }
    for child in element.child_elements() {
        collect_of_type(child, node_type, found);
    }
}
