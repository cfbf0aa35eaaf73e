//! Attribute merge decisions for a pair of unified elements

use super::context::MergeContext;
use super::Feature;
use crate::model::{AttributeOperation, MergeMode, NodeKey, NodeOperation, NodeType};
use crate::report::ActionType;
use crate::xml::{QName, XmlAttribute, XmlElement, ANDROID_URI};

/// Application attributes a library never contributes
const LIBRARY_DISCARDED: &[&str] = &["hasCode", "extractNativeLibs", "useEmbeddedDex"];

/// Tools attributes whose comma separated lists are unioned across documents
const LIST_DIRECTIVES: &[&str] = &["replace", "remove", "strict", "overrideLibrary"];

/// Which side of a merge step the incoming document sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Priority {
    /// Overlays win over the accumulated document
    Higher,
    /// Libraries lose against it
    Lower,
}

/// A unified pair, seen both structurally (base/incoming) and by priority
pub(crate) struct Sides<'e> {
    pub(crate) base: &'e XmlElement,
    pub(crate) incoming: &'e XmlElement,
    pub(crate) higher: &'e XmlElement,
    pub(crate) lower: &'e XmlElement,
    pub(crate) priority: Priority,
}

impl<'e> Sides<'e> {
    pub(crate) fn new(base: &'e XmlElement, incoming: &'e XmlElement, priority: Priority) -> Self {
        let (higher, lower) = match priority {
            Priority::Higher => (incoming, base),
            Priority::Lower => (base, incoming),
        };
        Self {
            base,
            incoming,
            higher,
            lower,
            priority,
        }
    }
}

/// Merge the attributes of a unified pair.
///
/// Attribute order follows the base element, then new incoming attributes.
pub(crate) fn merge_attributes(
    sides: &Sides<'_>,
    key: &NodeKey,
    operation: NodeOperation,
    ctx: &mut MergeContext<'_>,
) -> Vec<XmlAttribute> {
    let lower_is_library = sides.lower.origin().is_library();
    let ignore_lower =
        lower_is_library && ctx.model.policy(sides.higher.node_type()).merge_mode == MergeMode::LibraryChildrenOnly;
    let directives = Directives {
        replace: sides.higher.attribute_operation_targets(AttributeOperation::Replace),
        remove: sides.higher.attribute_operation_targets(AttributeOperation::Remove),
        strict: sides.higher.attribute_operation_targets(AttributeOperation::Strict),
        strict_node: operation == NodeOperation::Strict,
    };

    let mut names: Vec<&QName> = Vec::new();
    for attribute in sides.base.attributes().iter().chain(sides.incoming.attributes()) {
        if !names.contains(&attribute.name()) {
            names.push(attribute.name());
        }
    }

    let mut merged = Vec::with_capacity(names.len());
    for name in names {
        let higher = sides.higher.attribute(name);
        let lower = sides.lower.attribute(name);

        if name.is_tools() {
            merged.extend(merge_tools_attribute(name, higher, lower, lower_is_library));
            continue;
        }

        let discarded = ignore_lower || discarded_from_library(sides.lower, name);
        match (higher, lower) {
            (Some(higher), None) => merged.push(higher.clone()),
            (None, Some(lower)) => {
                if discarded {
                    ctx.actions
                        .record_attribute(key, name, ActionType::Ignored, lower.position(), None);
                } else if let Some(kept) = take_lower(sides, key, lower, &directives, ctx) {
                    merged.push(kept);
                }
            }
            (Some(higher), Some(lower)) => {
                if discarded {
                    ctx.actions
                        .record_attribute(key, name, ActionType::Ignored, lower.position(), None);
                    merged.push(higher.clone());
                } else {
                    merged.push(resolve_conflict(sides, key, higher, lower, &directives, ctx));
                }
            }
            (None, None) => {}
        }
    }
    merged
}

struct Directives {
    replace: Vec<QName>,
    remove: Vec<QName>,
    strict: Vec<QName>,
    strict_node: bool,
}

fn discarded_from_library(lower: &XmlElement, name: &QName) -> bool {
    lower.origin().is_library()
        && lower.node_type() == NodeType::Application
        && name.in_namespace(ANDROID_URI)
        && LIBRARY_DISCARDED.contains(&name.local.as_str())
}

fn take_lower(
    sides: &Sides<'_>,
    key: &NodeKey,
    lower: &XmlAttribute,
    directives: &Directives,
    ctx: &mut MergeContext<'_>,
) -> Option<XmlAttribute> {
    let name = lower.name();
    if directives.remove.contains(name) {
        ctx.actions.record_attribute(
            key,
            name,
            ActionType::Rejected,
            lower.position(),
            Some(AttributeOperation::Remove),
        );
        return None;
    }
    if directives.strict_node {
        ctx.error(
            lower.position(),
            format!(
                "Attribute {}@{} value=({}) from {}\n\tis not present at {}, which requires identical declarations (tools:node=\"strict\").",
                key,
                name,
                lower.value(),
                lower.position(),
                sides.higher.position()
            ),
        );
        return None;
    }
    ctx.actions
        .record_attribute(key, name, ActionType::Added, lower.position(), None);
    Some(lower.clone())
}

fn resolve_conflict(
    sides: &Sides<'_>,
    key: &NodeKey,
    higher: &XmlAttribute,
    lower: &XmlAttribute,
    directives: &Directives,
    ctx: &mut MergeContext<'_>,
) -> XmlAttribute {
    let name = higher.name();
    if higher.value() == lower.value() {
        ctx.actions
            .record_attribute(key, name, ActionType::Merged, lower.position(), None);
        return higher.clone();
    }

    if sides.higher.node_type() == NodeType::Application && name.is_android("hasCode") {
        let has_code = is_true(higher.value()) || is_true(lower.value());
        ctx.actions
            .record_attribute(key, name, ActionType::Merged, lower.position(), None);
        return higher.with_value(if has_code { "true" } else { "false" });
    }

    if directives.replace.contains(name) {
        ctx.actions.record_attribute(
            key,
            name,
            ActionType::Rejected,
            lower.position(),
            Some(AttributeOperation::Replace),
        );
        return higher.clone();
    }

    if directives.strict_node || directives.strict.contains(name) {
        ctx.error(
            higher.position(),
            format!(
                "Attribute {}@{} value=({}) from {}\n\tis also present at {} value=({}).\n\tValues must be identical because of tools:strict.",
                key,
                name,
                higher.value(),
                higher.position(),
                lower.position(),
                lower.value()
            ),
        );
        return higher.clone();
    }

    if ctx.has(Feature::HandleValueConflictsAutomatically) {
        ctx.actions
            .record_attribute(key, name, ActionType::Rejected, lower.position(), None);
        return higher.clone();
    }

    ctx.error(
        higher.position(),
        format!(
            "Attribute {}@{} value=({}) from {}\n\tis also present at {} value=({}).\n\tSuggestion: add 'tools:replace=\"{}\"' to <{}> element at {} to override.",
            key,
            name,
            higher.value(),
            higher.position(),
            lower.position(),
            lower.value(),
            name,
            sides.higher.name().local,
            sides.higher.position()
        ),
    );
    higher.clone()
}

fn merge_tools_attribute(
    name: &QName,
    higher: Option<&XmlAttribute>,
    lower: Option<&XmlAttribute>,
    lower_is_library: bool,
) -> Option<XmlAttribute> {
    match (higher, lower) {
        (Some(higher), None) => Some(higher.clone()),
        (None, Some(lower)) => (!lower_is_library).then(|| lower.clone()),
        (Some(higher), Some(lower)) => {
            if lower_is_library || !LIST_DIRECTIVES.contains(&name.local.as_str()) {
                return Some(higher.clone());
            }
            let mut entries: Vec<&str> = split_list(higher.value()).collect();
            for entry in split_list(lower.value()) {
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
            Some(higher.with_value(entries.join(",")))
        }
        (None, None) => None,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
