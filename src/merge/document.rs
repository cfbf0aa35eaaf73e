use super::context::MergeContext;
use super::element::merge_element;
use super::policy::Priority;
use crate::model::NodeType;
use crate::xml::{DocumentType, Transform, XmlDocument, XmlElement};
use tracing::debug;

/// Drops delivery metadata (`dist:*`) that only the declaring module may carry
struct LibraryFilter;

impl Transform for LibraryFilter {
    fn remove(&mut self, element: &XmlElement) -> bool {
        matches!(
            element.node_type(),
            NodeType::DistModule | NodeType::DistFusing | NodeType::DistElement
        )
    }
}

/// Merge `incoming` into the accumulated document `base`.
///
/// Overlays take priority over `base`, libraries yield to it. The result
/// keeps `base`'s identity and source.
pub(crate) fn merge_documents(base: &XmlDocument, incoming: &XmlDocument, ctx: &mut MergeContext<'_>) -> XmlDocument {
    debug!("Merging {} {} into {}", incoming.doc_type(), incoming.source(), base.source());

    let merged_root = match incoming.doc_type() {
        DocumentType::Library => {
            let (filtered, _) = incoming.root().clone_and_transform(&mut LibraryFilter);
            merge_element(base.root(), &filtered, Priority::Lower, ctx)
        }
        DocumentType::Main | DocumentType::Overlay => {
            merge_element(base.root(), incoming.root(), Priority::Higher, ctx)
        }
    };

    let mut namespaces = base.namespaces().clone();
    namespaces.absorb(incoming.namespaces());
    base.with_root(merged_root).with_namespaces(namespaces)
}
