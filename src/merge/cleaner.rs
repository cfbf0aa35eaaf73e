use super::context::MergeContext;
use crate::model::{AttributeOperation, NodeOperation};
use crate::report::ActionType;
use crate::xml::{Transform, XmlAttribute, XmlDocument, XmlElement, TOOLS_URI};

/// Strips removal markers and every tools attribute
struct ToolsCleaner;

impl Transform for ToolsCleaner {
    fn remove(&mut self, element: &XmlElement) -> bool {
        element.is_removal_marker()
    }

    fn rewrite_attributes(&mut self, _element: &XmlElement, attributes: &mut Vec<XmlAttribute>) -> bool {
        let before = attributes.len();
        attributes.retain(|a| !a.name.is_tools());
        attributes.len() != before
    }
}

/// Remove tools directives and the tools namespace declaration
pub(crate) fn clean_tools(doc: &XmlDocument) -> XmlDocument {
    let (root, _) = doc.root().clone_and_transform(&mut ToolsCleaner);
    let mut namespaces = doc.namespaces().clone();
    namespaces.remove_uri(TOOLS_URI);
    doc.with_root(root).with_namespaces(namespaces)
}

/// Warn about `tools:node="remove"` and `tools:replace` that never applied
pub(crate) fn report_unused_directives(doc: &XmlDocument, ctx: &mut MergeContext<'_>) {
    visit(doc.root(), ctx);
}

fn visit(element: &XmlElement, ctx: &mut MergeContext<'_>) {
    let key = ctx.model.key(element);
    let line = element
        .position()
        .line()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());
    let file = element.origin().file.file_name();

    if element.node_operation() == Ok(Some(NodeOperation::Remove)) && !ctx.actions.has_rejection(&key.to_string()) {
        ctx.warning(
            element.position(),
            format!(
                "{} was tagged at {}:{} to remove other declarations but no other declaration present",
                key, file, line
            ),
        );
    }

    for attribute in element.attribute_operation_targets(AttributeOperation::Replace) {
        let used = ctx
            .actions
            .attribute_records(&key.to_string(), &attribute.to_string())
            .iter()
            .any(|r| matches!(r.action_type, ActionType::Rejected | ActionType::Merged));
        if !used {
            ctx.warning(
                element.position(),
                format!(
                    "{}@{} was tagged at {}:{} to replace other declarations but no other declaration present",
                    key, attribute, file, line
                ),
            );
        }
    }

    for child in element.child_elements() {
        visit(child, ctx);
    }
}
