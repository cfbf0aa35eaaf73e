use crate::xml::{QName, ANDROID_URI, DIST_URI};
use std::fmt;

/// Closed set of manifest element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Action,
    Activity,
    ActivityAlias,
    Application,
    Attribution,
    Category,
    CompatibleScreens,
    Data,
    DistModule,
    DistFusing,
    DistElement,
    GrantUriPermission,
    Instrumentation,
    Intent,
    IntentFilter,
    Manifest,
    MetaData,
    NavGraph,
    Overlay,
    Package,
    PathPermission,
    Permission,
    PermissionGroup,
    PermissionTree,
    Profileable,
    Property,
    Provider,
    Queries,
    QueriesProvider,
    Receiver,
    Screen,
    Service,
    SupportsGlTexture,
    SupportsScreens,
    UsesConfiguration,
    UsesFeature,
    UsesLibrary,
    UsesNativeLibrary,
    UsesPermission,
    UsesPermissionSdk23,
    UsesSdk,
    UsesSplit,
    Custom,
}

impl NodeType {
    /// Element name as written in a manifest
    pub fn tag_name(&self) -> &'static str {
        match self {
            NodeType::Action => "action",
            NodeType::Activity => "activity",
            NodeType::ActivityAlias => "activity-alias",
            NodeType::Application => "application",
            NodeType::Attribution => "attribution",
            NodeType::Category => "category",
            NodeType::CompatibleScreens => "compatible-screens",
            NodeType::Data => "data",
            NodeType::DistModule => "dist:module",
            NodeType::DistFusing => "dist:fusing",
            NodeType::DistElement => "dist:element",
            NodeType::GrantUriPermission => "grant-uri-permission",
            NodeType::Instrumentation => "instrumentation",
            NodeType::Intent => "intent",
            NodeType::IntentFilter => "intent-filter",
            NodeType::Manifest => "manifest",
            NodeType::MetaData => "meta-data",
            NodeType::NavGraph => "nav-graph",
            NodeType::Overlay => "overlay",
            NodeType::Package => "package",
            NodeType::PathPermission => "path-permission",
            NodeType::Permission => "permission",
            NodeType::PermissionGroup => "permission-group",
            NodeType::PermissionTree => "permission-tree",
            NodeType::Profileable => "profileable",
            NodeType::Property => "property",
            NodeType::Provider => "provider",
            NodeType::Queries => "queries",
            NodeType::QueriesProvider => "provider",
            NodeType::Receiver => "receiver",
            NodeType::Screen => "screen",
            NodeType::Service => "service",
            NodeType::SupportsGlTexture => "supports-gl-texture",
            NodeType::SupportsScreens => "supports-screens",
            NodeType::UsesConfiguration => "uses-configuration",
            NodeType::UsesFeature => "uses-feature",
            NodeType::UsesLibrary => "uses-library",
            NodeType::UsesNativeLibrary => "uses-native-library",
            NodeType::UsesPermission => "uses-permission",
            NodeType::UsesPermissionSdk23 => "uses-permission-sdk-23",
            NodeType::UsesSdk => "uses-sdk",
            NodeType::UsesSplit => "uses-split",
            NodeType::Custom => "custom",
        }
    }

    /// Classify an element by name and the type of its parent.
    ///
    /// Elements in the android namespace are treated like unqualified ones;
    /// any other namespace yields [`NodeType::Custom`].
    pub fn classify(name: &QName, parent: Option<NodeType>) -> NodeType {
        match name.namespace.as_deref() {
            None | Some(ANDROID_URI) => Self::from_tag(&name.local, parent),
            Some(DIST_URI) => match name.local.as_str() {
                "module" => NodeType::DistModule,
                "fusing" => NodeType::DistFusing,
                _ => NodeType::DistElement,
            },
            Some(_) => NodeType::Custom,
        }
    }

    fn from_tag(tag: &str, parent: Option<NodeType>) -> NodeType {
        match (tag, parent) {
            ("provider", Some(NodeType::Queries)) => NodeType::QueriesProvider,
            ("action", _) => NodeType::Action,
            ("activity", _) => NodeType::Activity,
            ("activity-alias", _) => NodeType::ActivityAlias,
            ("application", _) => NodeType::Application,
            ("attribution", _) => NodeType::Attribution,
            ("category", _) => NodeType::Category,
            ("compatible-screens", _) => NodeType::CompatibleScreens,
            ("data", _) => NodeType::Data,
            ("grant-uri-permission", _) => NodeType::GrantUriPermission,
            ("instrumentation", _) => NodeType::Instrumentation,
            ("intent", _) => NodeType::Intent,
            ("intent-filter", _) => NodeType::IntentFilter,
            ("manifest", _) => NodeType::Manifest,
            ("meta-data", _) => NodeType::MetaData,
            ("nav-graph", _) => NodeType::NavGraph,
            ("overlay", _) => NodeType::Overlay,
            ("package", _) => NodeType::Package,
            ("path-permission", _) => NodeType::PathPermission,
            ("permission", _) => NodeType::Permission,
            ("permission-group", _) => NodeType::PermissionGroup,
            ("permission-tree", _) => NodeType::PermissionTree,
            ("profileable", _) => NodeType::Profileable,
            ("property", _) => NodeType::Property,
            ("provider", _) => NodeType::Provider,
            ("queries", _) => NodeType::Queries,
            ("receiver", _) => NodeType::Receiver,
            ("screen", _) => NodeType::Screen,
            ("service", _) => NodeType::Service,
            ("supports-gl-texture", _) => NodeType::SupportsGlTexture,
            ("supports-screens", _) => NodeType::SupportsScreens,
            ("uses-configuration", _) => NodeType::UsesConfiguration,
            ("uses-feature", _) => NodeType::UsesFeature,
            ("uses-library", _) => NodeType::UsesLibrary,
            ("uses-native-library", _) => NodeType::UsesNativeLibrary,
            ("uses-permission", _) => NodeType::UsesPermission,
            ("uses-permission-sdk-23", _) => NodeType::UsesPermissionSdk23,
            ("uses-sdk", _) => NodeType::UsesSdk,
            ("uses-split", _) => NodeType::UsesSplit,
            _ => NodeType::Custom,
        }
    }

    /// Components that must declare `android:exported` when they have intent filters
    pub fn requires_explicit_export(&self) -> bool {
        matches!(
            self,
            NodeType::Activity | NodeType::ActivityAlias | NodeType::Service | NodeType::Receiver
        )
    }

    /// Android attributes holding class names that may be written relative to the package
    pub fn class_name_attributes(&self) -> &'static [&'static str] {
        match self {
            NodeType::Application => &["name", "backupAgent", "manageSpaceActivity"],
            NodeType::Activity => &["name", "parentActivityName"],
            NodeType::ActivityAlias => &["name", "targetActivity", "parentActivityName"],
            NodeType::Service
            | NodeType::Receiver
            | NodeType::Provider
            | NodeType::Instrumentation
            | NodeType::Property => &["name"],
            _ => &[],
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name())
    }
}
