//! `<nav-graph>` expansion into deep-link intent filters
//!
//! Navigation graphs arrive as JSON arrays, one entry per navigation file:
//!
//! ```json
//! [{"name": "main", "navigationXmlIds": ["settings"],
//!   "deepLinks": [{"schemes": ["https"], "host": "example.com", "port": -1,
//!                  "path": "/item/{id}", "isAutoVerify": true}]}]
//! ```

use super::context::MergeContext;
use super::loader::InputSource;
use crate::error::MergeFailure;
use crate::model::NodeType;
use crate::report::ActionType;
use crate::xml::{Origin, QName, SourceSpan, XmlAttribute, XmlDocument, XmlElement, XmlNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

const ACTION_VIEW: &str = "android.intent.action.VIEW";
const CATEGORY_DEFAULT: &str = "android.intent.category.DEFAULT";
const CATEGORY_BROWSABLE: &str = "android.intent.category.BROWSABLE";
const DEFAULT_SCHEMES: [&str; 2] = ["http", "https"];

/// One navigation file: its deep links and the files it includes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationXmlDocument {
    pub name: String,
    #[serde(default)]
    pub navigation_xml_ids: Vec<String>,
    #[serde(default)]
    pub deep_links: Vec<DeepLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLink {
    /// Empty means both http and https
    #[serde(default)]
    pub schemes: Vec<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "no_port")]
    pub port: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub fragment: Option<String>,
    #[serde(default)]
    pub is_auto_verify: bool,
    /// `None` means VIEW, an empty string means no action
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

fn no_port() -> i32 {
    -1
}

/// Read every navigation JSON source, keyed by navigation file name.
///
/// The first declaration of a name wins.
pub(crate) fn load_navigation(
    sources: &[InputSource],
) -> Result<BTreeMap<String, NavigationXmlDocument>, MergeFailure> {
    let mut navigation = BTreeMap::new();
    for source in sources {
        let (file, text) = source.read()?;
        let documents: Vec<NavigationXmlDocument> =
            serde_json::from_str(&text).map_err(|source| MergeFailure::Navigation {
                file: file.to_string(),
                source,
            })?;
        debug!("Loaded {} navigation files from {}", documents.len(), file);
        for document in documents {
            navigation.entry(document.name.clone()).or_insert(document);
        }
    }
    Ok(navigation)
}

/// Replace every `<nav-graph>` with the intent filters of its deep links
pub(crate) fn expand_nav_graphs(
    doc: &XmlDocument,
    navigation: &BTreeMap<String, NavigationXmlDocument>,
    ctx: &mut MergeContext<'_>,
) -> XmlDocument {
    if doc.elements_of_type(NodeType::NavGraph).is_empty() {
        return doc.clone();
    }
    let root = expand_element(doc.root(), navigation, ctx);
    doc.with_root(root)
}

fn expand_element(
    element: &XmlElement,
    navigation: &BTreeMap<String, NavigationXmlDocument>,
    ctx: &mut MergeContext<'_>,
) -> XmlElement {
    let mut copy = element.shell();
    copy.attributes = element.attributes.clone();
    let mut emitted: Vec<&DeepLink> = Vec::new();

    for child in &element.children {
        match child {
            XmlNode::Element(nav_graph) if nav_graph.node_type() == NodeType::NavGraph => {
                for link in deep_links_of(nav_graph, navigation, ctx) {
                    if emitted.contains(&link) {
                        continue;
                    }
                    emitted.push(link);
                    let filter = intent_filter(link, nav_graph.origin(), nav_graph.span());
                    ctx.record_subtree(&filter, ActionType::Added);
                    copy.children.push(XmlNode::Element(filter));
                }
            }
            XmlNode::Element(nested) => copy
                .children
                .push(XmlNode::Element(expand_element(nested, navigation, ctx))),
            other => copy.children.push(other.clone()),
        }
    }
    copy
}

fn deep_links_of<'n>(
    nav_graph: &XmlElement,
    navigation: &'n BTreeMap<String, NavigationXmlDocument>,
    ctx: &mut MergeContext<'_>,
) -> Vec<&'n DeepLink> {
    let Some(value) = nav_graph.android_attribute("value") else {
        ctx.error(
            nav_graph.position(),
            format!("<nav-graph> at {} is missing android:value", nav_graph.position()),
        );
        return Vec::new();
    };
    let id = value.strip_prefix("@navigation/").unwrap_or(value);

    let mut walk = Walk {
        navigation,
        stack: Vec::new(),
        included: BTreeSet::new(),
        links: Vec::new(),
    };
    if walk.visit(id, nav_graph, ctx) {
        walk.links
    } else {
        Vec::new()
    }
}

struct Walk<'n> {
    navigation: &'n BTreeMap<String, NavigationXmlDocument>,
    stack: Vec<&'n str>,
    included: BTreeSet<&'n str>,
    links: Vec<&'n DeepLink>,
}

impl<'n> Walk<'n> {
    /// Depth-first collection; false once an error was recorded
    fn visit(&mut self, id: &str, nav_graph: &XmlElement, ctx: &mut MergeContext<'_>) -> bool {
        let navigation = self.navigation;
        let Some((name, document)) = navigation.get_key_value(id) else {
            ctx.error(
                nav_graph.position(),
                format!("Referenced navigation file with navigationXmlId = {} not found", id),
            );
            return false;
        };
        let name = name.as_str();

        if self.stack.contains(&name) {
            let mut chain: Vec<&str> = self.stack.clone();
            chain.push(name);
            ctx.error(
                nav_graph.position(),
                format!(
                    "Illegal circular reference among navigation files when traversing navigation file references: {}.",
                    chain.join(" > ")
                ),
            );
            return false;
        }
        if !self.included.insert(name) {
            ctx.warning(
                nav_graph.position(),
                format!(
                    "The navigation file with ID \"{}\" is included multiple times in the navigation graph, \
                     but only deep links on the first instance will be triggered at runtime. Consider \
                     consolidating these instances into a single <include> at a higher level of your \
                     navigation graph hierarchy.",
                    name
                ),
            );
            return true;
        }

        self.stack.push(name);
        self.links.extend(document.deep_links.iter());
        for included in &document.navigation_xml_ids {
            if !self.visit(included, nav_graph, ctx) {
                return false;
            }
        }
        self.stack.pop();
        true
    }
}

fn intent_filter(link: &DeepLink, origin: &Arc<Origin>, span: Option<SourceSpan>) -> XmlElement {
    let node = |node_type: NodeType, attributes: &[(&str, &str)]| {
        let mut element = XmlElement::new(QName::local(node_type.tag_name()), node_type, origin.clone());
        element.span = span;
        for (name, value) in attributes {
            element.set_attribute(XmlAttribute::new(QName::android(*name), *value, origin.clone(), span));
        }
        element
    };

    let mut filter = node(NodeType::IntentFilter, &[]);
    if link.is_auto_verify {
        filter.set_attribute(XmlAttribute::new(QName::android("autoVerify"), "true", origin.clone(), span));
    }

    let action = link.action.as_deref().unwrap_or(ACTION_VIEW);
    if !action.is_empty() {
        filter.push_child(node(NodeType::Action, &[("name", action)]));
    }
    filter.push_child(node(NodeType::Category, &[("name", CATEGORY_DEFAULT)]));
    filter.push_child(node(NodeType::Category, &[("name", CATEGORY_BROWSABLE)]));

    if link.schemes.is_empty() {
        for scheme in DEFAULT_SCHEMES {
            filter.push_child(node(NodeType::Data, &[("scheme", scheme)]));
        }
    } else {
        for scheme in &link.schemes {
            filter.push_child(node(NodeType::Data, &[("scheme", scheme.as_str())]));
        }
    }
    if let Some(host) = link.host.as_deref().filter(|h| !h.is_empty()) {
        let host = match host.strip_prefix(".*") {
            Some(rest) => format!("*{}", rest),
            None => host.to_string(),
        };
        filter.push_child(node(NodeType::Data, &[("host", host.as_str())]));
    }
    if link.port != -1 {
        let port = link.port.to_string();
        filter.push_child(node(NodeType::Data, &[("port", port.as_str())]));
    }
    if !link.path.is_empty() {
        let (name, value) = path_attribute(&link.path);
        filter.push_child(node(NodeType::Data, &[(name, value.as_str())]));
    }
    if let Some(mime_type) = link.mime_type.as_deref().filter(|m| !m.is_empty()) {
        filter.push_child(node(NodeType::Data, &[("mimeType", mime_type)]));
    }
    filter
}

/// Pick the data attribute matching a deep-link path.
///
/// Wildcards make a pattern (arguments become `.*`); otherwise arguments
/// cut the path into a prefix.
fn path_attribute(path: &str) -> (&'static str, String) {
    if path.contains(".*") {
        let mut pattern = String::with_capacity(path.len());
        let mut rest = path;
        while let Some(start) = rest.find('{') {
            pattern.push_str(&rest[..start]);
            match rest[start..].find('}') {
                Some(end) => {
                    pattern.push_str(".*");
                    rest = &rest[start + end + 1..];
                }
                None => {
                    rest = &rest[start..];
                    break;
                }
            }
        }
        pattern.push_str(rest);
        ("pathPattern", pattern)
    } else if let Some(start) = path.find('{') {
        ("pathPrefix", path[..start].to_string())
    } else {
        ("path", path.to_string())
    }
}
