//! Policy table for manifest node types
//!
//! [`ManifestModel`] is an explicitly constructed, immutable table mapping
//! each [`NodeType`] to how its key is computed and how it merges. It is
//! passed into the merger rather than living in a global, so differently
//! configured merges can run side by side.

mod key;
mod node_type;
mod operation;

pub use key::{content_signature, KeyId, NodeKey};
pub use node_type::NodeType;
pub use operation::{AttributeOperation, NodeOperation};

use crate::xml::{QName, XmlElement};
use std::collections::HashMap;

/// How a node's merge identity is derived from its attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResolver {
    /// One per parent, unified by type alone
    Singleton,
    /// Never unified
    None,
    /// Value of a single android attribute
    Attribute(&'static str),
    /// First present android attribute of the list
    FirstOf(&'static [&'static str]),
    /// Present android attributes joined with `+`
    Composite(&'static [&'static str]),
    /// The full content of the subtree
    Content,
}

/// Default treatment of a node's attributes when it is unified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Union attributes and merge children by key
    Merge,
    /// Attributes contributed by library documents are ignored; children still merge
    LibraryChildrenOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTypePolicy {
    pub key_resolver: KeyResolver,
    pub merge_mode: MergeMode,
    /// Whether siblings sharing a key are legal inside one document
    pub multiple_declarations_allowed: bool,
}

impl NodeTypePolicy {
    pub const fn new(key_resolver: KeyResolver, merge_mode: MergeMode, multiple_declarations_allowed: bool) -> Self {
        Self {
            key_resolver,
            merge_mode,
            multiple_declarations_allowed,
        }
    }
}

const NAME: KeyResolver = KeyResolver::Attribute("name");
const PATHS: KeyResolver = KeyResolver::Composite(&["path", "pathPrefix", "pathPattern"]);
const CUSTOM: NodeTypePolicy = NodeTypePolicy::new(KeyResolver::None, MergeMode::Merge, true);

#[derive(Debug, Clone)]
pub struct ManifestModel {
    policies: HashMap<NodeType, NodeTypePolicy>,
}

impl ManifestModel {
    /// The standard Android manifest table
    pub fn new() -> Self {
        use KeyResolver::*;
        use MergeMode::*;
        use NodeType as T;

        let single = |key| NodeTypePolicy::new(key, Merge, false);
        let multiple = |key| NodeTypePolicy::new(key, Merge, true);

        let table = [
            (T::Action, multiple(NAME)),
            (T::Activity, single(NAME)),
            (T::ActivityAlias, single(NAME)),
            (T::Application, single(Singleton)),
            (T::Attribution, single(Attribute("tag"))),
            (T::Category, multiple(NAME)),
            (T::CompatibleScreens, single(Singleton)),
            (
                T::Data,
                multiple(Composite(&[
                    "scheme", "host", "port", "path", "pathPrefix", "pathPattern", "mimeType",
                ])),
            ),
            (T::DistModule, single(Singleton)),
            (T::DistFusing, single(Singleton)),
            (T::DistElement, multiple(Content)),
            (T::GrantUriPermission, single(PATHS)),
            (T::Instrumentation, single(NAME)),
            (T::Intent, multiple(Content)),
            (T::IntentFilter, multiple(Content)),
            (T::Manifest, NodeTypePolicy::new(Singleton, LibraryChildrenOnly, false)),
            (T::MetaData, single(NAME)),
            (T::NavGraph, single(Attribute("value"))),
            (T::Overlay, multiple(None)),
            (T::Package, single(NAME)),
            (T::PathPermission, single(PATHS)),
            (T::Permission, single(NAME)),
            (T::PermissionGroup, single(NAME)),
            (T::PermissionTree, single(NAME)),
            (T::Profileable, single(Singleton)),
            (T::Property, single(NAME)),
            (T::Provider, single(NAME)),
            (T::Queries, single(Singleton)),
            (T::QueriesProvider, single(Attribute("authority"))),
            (T::Receiver, single(NAME)),
            (T::Screen, single(Composite(&["screenSize", "screenDensity"]))),
            (T::Service, single(NAME)),
            (T::SupportsGlTexture, single(NAME)),
            (T::SupportsScreens, single(Singleton)),
            (T::UsesConfiguration, multiple(Content)),
            (T::UsesFeature, single(FirstOf(&["name", "glEsVersion"]))),
            (T::UsesLibrary, single(NAME)),
            (T::UsesNativeLibrary, single(NAME)),
            (
                T::UsesPermission,
                single(Composite(&["name", "requiredFeature", "requiredNotFeature"])),
            ),
            (T::UsesPermissionSdk23, single(NAME)),
            (T::UsesSdk, NodeTypePolicy::new(Singleton, LibraryChildrenOnly, false)),
            (T::UsesSplit, single(NAME)),
            (T::Custom, CUSTOM),
        ];

        Self {
            policies: table.into_iter().collect(),
        }
    }

    /// Replace the policy of one node type
    pub fn with_policy(mut self, node_type: NodeType, policy: NodeTypePolicy) -> Self {
        self.policies.insert(node_type, policy);
        self
    }

    pub fn policy(&self, node_type: NodeType) -> NodeTypePolicy {
        self.policies.get(&node_type).copied().unwrap_or(CUSTOM)
    }

    pub fn node_type(&self, name: &QName, parent: Option<NodeType>) -> NodeType {
        NodeType::classify(name, parent)
    }

    pub fn key(&self, element: &XmlElement) -> NodeKey {
        key::compute_key(&self.policy(element.node_type()).key_resolver, element)
    }
}

impl Default for ManifestModel {
    fn default() -> Self {
        Self::new()
    }
}
