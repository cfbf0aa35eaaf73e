use crate::model::NodeType;
use crate::placeholder::{PlaceholderEncoder, PATH_ATTRIBUTES};
use crate::xml::{Transform, XmlAttribute, XmlDocument, XmlElement, ANDROID_URI};
use std::borrow::Cow;

/// Rewrites the merged manifest into something the resource compiler accepts
struct AaptSafeTransform {
    encoder: PlaceholderEncoder,
    make_safe: bool,
}

impl Transform for AaptSafeTransform {
    fn remove(&mut self, element: &XmlElement) -> bool {
        element.node_type() == NodeType::NavGraph
    }

    fn rewrite_attributes(&mut self, element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        if !self.make_safe {
            return false;
        }
        let mut changed = false;
        for attribute in attributes.iter_mut() {
            if element.node_type() == NodeType::Manifest
                && attribute.name.namespace.is_none()
                && attribute.name.local == "package"
                && !attribute.value.contains('.')
            {
                attribute.value = format!("{}.for.verification", attribute.value);
                changed = true;
                continue;
            }
            let path_like = attribute.name.in_namespace(ANDROID_URI)
                && PATH_ATTRIBUTES.contains(&attribute.name.local.as_str());
            if path_like {
                if let Cow::Owned(encoded) = self.encoder.encode(&attribute.value) {
                    attribute.value = encoded;
                    changed = true;
                }
            }
        }
        changed
    }
}

/// AAPT-safe variant of `doc`, or `None` when it would be identical
pub(crate) fn aapt_safe_document(doc: &XmlDocument, make_safe: bool) -> Option<XmlDocument> {
    let mut transform = AaptSafeTransform {
        encoder: PlaceholderEncoder::new(),
        make_safe,
    };
    let (root, changed) = doc.root().clone_and_transform(&mut transform);
    changed.then(|| doc.with_root(root))
}
