use super::{XmlAttribute, XmlElement, XmlNode};

/// A pure rewrite of an element tree.
///
/// [`XmlElement::clone_and_transform`] walks the tree pre-order, asks the
/// transform which elements to drop and lets it rewrite attributes. Comments
/// directly preceding a dropped element are dropped with it.
pub trait Transform {
    /// Whether `element` (and its subtree) should be left out of the copy
    fn remove(&mut self, _element: &XmlElement) -> bool {
        false
    }

    /// Rewrite the attributes of `element`; returns true if anything changed
    fn rewrite_attributes(&mut self, _element: &XmlElement, _attributes: &mut Vec<XmlAttribute>) -> bool {
        false
    }
}

impl XmlElement {
    /// Copy this tree through `transform`, reporting whether anything changed.
    ///
    /// The root itself is never removed.
    pub fn clone_and_transform<T: Transform + ?Sized>(&self, transform: &mut T) -> (XmlElement, bool) {
        let mut copy = self.shell();
        let mut attributes = self.attributes.clone();
        let mut changed = transform.rewrite_attributes(self, &mut attributes);
        copy.attributes = attributes;

        let mut pending_comments: Vec<XmlNode> = Vec::new();
        for child in &self.children {
            match child {
                XmlNode::Comment(_) => pending_comments.push(child.clone()),
                XmlNode::Text(_) => {
                    copy.children.append(&mut pending_comments);
                    copy.children.push(child.clone());
                }
                XmlNode::Element(element) => {
                    if transform.remove(element) {
                        changed = true;
                        pending_comments.clear();
                        continue;
                    }
                    let (transformed, child_changed) = element.clone_and_transform(transform);
                    changed |= child_changed;
                    copy.children.append(&mut pending_comments);
                    copy.children.push(XmlNode::Element(transformed));
                }
            }
        }
        copy.children.append(&mut pending_comments);

        (copy, changed)
    }
}
