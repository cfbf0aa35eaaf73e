//! Element and children merging for one unified pair

use super::context::MergeContext;
use super::policy::{merge_attributes, Priority, Sides};
use super::Feature;
use crate::model::{MergeMode, NodeKey, NodeOperation, NodeType};
use crate::report::ActionType;
use crate::xml::{XmlElement, XmlNode};
use tracing::debug;

/// Merge a unified pair into a new element.
///
/// `base` belongs to the accumulated document and dictates child order;
/// `priority` says whether `incoming` wins or loses against it.
pub(crate) fn merge_element(
    base: &XmlElement,
    incoming: &XmlElement,
    priority: Priority,
    ctx: &mut MergeContext<'_>,
) -> XmlElement {
    let sides = Sides::new(base, incoming, priority);
    let key = ctx.model.key(sides.higher);
    let operation = sides
        .higher
        .node_operation()
        .ok()
        .flatten()
        .unwrap_or(NodeOperation::Merge);

    let selected = match sides.higher.selector() {
        Some(selector) => sides.lower.origin().package.as_deref() == Some(selector),
        None => true,
    };

    match operation {
        NodeOperation::Remove | NodeOperation::RemoveAll | NodeOperation::Replace if selected => {
            debug!("{} {} by {}", key, operation, sides.higher.position());
            ctx.actions
                .record_node(&key, ActionType::Rejected, sides.lower.position(), Some(operation));
            return sides.higher.clone();
        }
        NodeOperation::Remove | NodeOperation::RemoveAll => {
            // The marker targets another library; this one survives untouched.
            ctx.actions
                .record_node(&key, ActionType::Merged, sides.lower.position(), None);
            return sides.lower.clone();
        }
        _ => {}
    }

    if sides.lower.is_removal_marker() {
        return sides.higher.clone();
    }

    if sides.higher.node_type() == NodeType::UsesSdk && sides.lower.origin().is_library() {
        check_library_min_sdk(Some(sides.higher), sides.lower, ctx);
    }

    let operation = if selected { operation } else { NodeOperation::Merge };
    let mut merged = base.shell();
    merged.attributes = merge_attributes(&sides, &key, operation, ctx);
    merged.children = if operation == NodeOperation::MergeOnlyAttributes {
        sides.higher.children().to_vec()
    } else {
        merge_children(&sides, ctx)
    };
    ctx.actions
        .record_node(&key, ActionType::Merged, sides.lower.position(), None);
    merged
}

/// Leading comments plus the node they describe
struct Unit<'e> {
    leading: Vec<&'e str>,
    node: &'e XmlNode,
}

fn units(children: &[XmlNode]) -> (Vec<Unit<'_>>, Vec<&XmlNode>) {
    let mut units = Vec::new();
    let mut pending = Vec::new();
    for child in children {
        match child {
            XmlNode::Comment(_) => pending.push(child),
            _ => units.push(Unit {
                leading: pending.drain(..).filter_map(comment_text).collect(),
                node: child,
            }),
        }
    }
    (units, pending)
}

fn comment_text(node: &XmlNode) -> Option<&str> {
    match node {
        XmlNode::Comment(text) => Some(text),
        _ => None,
    }
}

fn push_unit(out: &mut Vec<XmlNode>, unit: &Unit<'_>) {
    out.extend(unit.leading.iter().map(|c| XmlNode::Comment(c.to_string())));
    out.push(unit.node.clone());
}

fn merge_children(sides: &Sides<'_>, ctx: &mut MergeContext<'_>) -> Vec<XmlNode> {
    let removals: Vec<(NodeType, Option<&str>)> = sides
        .higher
        .child_elements()
        .filter(|c| c.node_operation() == Ok(Some(NodeOperation::RemoveAll)))
        .map(|c| (c.node_type(), c.selector()))
        .collect();

    let (base_units, base_trailing) = units(sides.base.children());
    let (incoming_units, _) = units(sides.incoming.children());
    let incoming_keys: Vec<Option<NodeKey>> = incoming_units
        .iter()
        .map(|u| u.node.as_element().map(|e| ctx.model.key(e)))
        .collect();
    let mut matched = vec![false; incoming_units.len()];
    let mut out = Vec::with_capacity(base_units.len() + incoming_units.len());

    for unit in &base_units {
        let Some(child) = unit.node.as_element() else {
            push_unit(&mut out, unit);
            continue;
        };
        if sides.priority == Priority::Higher && is_suppressed(child, &removals) {
            reject_removed(child, ctx);
            continue;
        }

        let key = ctx.model.key(child);
        let found = if key.is_unifiable() {
            (0..incoming_units.len()).find(|&i| !matched[i] && incoming_keys[i].as_ref() == Some(&key))
        } else {
            None
        };
        let Some(index) = found else {
            push_unit(&mut out, unit);
            continue;
        };

        matched[index] = true;
        let other = &incoming_units[index];
        out.extend(unit.leading.iter().map(|c| XmlNode::Comment(c.to_string())));
        for comment in &other.leading {
            if !unit.leading.contains(comment) {
                out.push(XmlNode::Comment(comment.to_string()));
            }
        }
        if let Some(incoming) = other.node.as_element() {
            out.push(XmlNode::Element(merge_element(child, incoming, sides.priority, ctx)));
        }
    }

    for (index, unit) in incoming_units.iter().enumerate() {
        if matched[index] {
            continue;
        }
        let Some(child) = unit.node.as_element() else {
            continue;
        };
        if sides.priority == Priority::Lower && !accepts_lower_only(child, &removals, ctx) {
            continue;
        }
        ctx.record_subtree(child, ActionType::Added);
        push_unit(&mut out, unit);
    }

    out.extend(base_trailing.into_iter().cloned());
    out
}

/// Whether a lower-priority element without a counterpart joins the result
fn accepts_lower_only(
    child: &XmlElement,
    removals: &[(NodeType, Option<&str>)],
    ctx: &mut MergeContext<'_>,
) -> bool {
    if is_suppressed(child, removals) {
        reject_removed(child, ctx);
        return false;
    }

    let missing: Vec<&str> = child
        .required_features()
        .into_iter()
        .filter(|f| !ctx.known_features.iter().any(|k| k == f))
        .collect();
    if !missing.is_empty() {
        let key = ctx.model.key(child);
        ctx.actions
            .record_node(&key, ActionType::Ignored, child.position(), None);
        ctx.info(
            child.position(),
            format!("{} was not merged because it requires feature(s) {}", key, missing.join(", ")),
        );
        return false;
    }

    let library_only = child.origin().is_library()
        && ctx.model.policy(child.node_type()).merge_mode == MergeMode::LibraryChildrenOnly;
    if library_only {
        if child.node_type() == NodeType::UsesSdk {
            check_library_min_sdk(None, child, ctx);
        }
        let key = ctx.model.key(child);
        ctx.actions
            .record_node(&key, ActionType::Ignored, child.position(), None);
        return false;
    }
    true
}

fn is_suppressed(child: &XmlElement, removals: &[(NodeType, Option<&str>)]) -> bool {
    removals.iter().any(|(node_type, selector)| {
        *node_type == child.node_type()
            && selector.map_or(true, |s| child.origin().package.as_deref() == Some(s))
    })
}

fn reject_removed(child: &XmlElement, ctx: &mut MergeContext<'_>) {
    let key = ctx.model.key(child);
    ctx.actions.record_node(
        &key,
        ActionType::Rejected,
        child.position(),
        Some(NodeOperation::RemoveAll),
    );
}

/// A library may not require a newer platform than the app supports.
fn check_library_min_sdk(app: Option<&XmlElement>, library: &XmlElement, ctx: &mut MergeContext<'_>) {
    if ctx.has(Feature::DisableMinsdklibraryCheck) {
        return;
    }
    let library_package = library.origin().package.clone();
    let overridden = match (&library_package, app.and_then(|a| a.tools_attribute("overrideLibrary"))) {
        (Some(package), Some(list)) => list.split(',').any(|p| p.trim() == package),
        _ => false,
    };
    if overridden {
        return;
    }

    let app_min = ctx
        .min_sdk_override
        .clone()
        .or_else(|| app.and_then(|a| a.android_attribute("minSdkVersion")).map(str::to_string))
        .unwrap_or_else(|| "1".to_string());
    let library_min = library.android_attribute("minSdkVersion").unwrap_or("1");
    if !is_older_sdk(&app_min, library_min) {
        return;
    }

    let package = library_package.unwrap_or_default();
    let position = app.map(XmlElement::position).unwrap_or_else(|| library.position());
    ctx.error(
        position,
        format!(
            "uses-sdk:minSdkVersion {} cannot be smaller than version {} declared in library {}\n\tSuggestion: use a compatible library with a minSdk of at most {},\n\t\tor increase this project's minSdk version to at least {},\n\t\tor use tools:overrideLibrary=\"{}\" to force usage (may lead to runtime failures)",
            app_min,
            library_min,
            library.origin().file,
            app_min,
            library_min,
            package
        ),
    );
}

/// Compare API levels; a codename preview is newer than any number
fn is_older_sdk(app: &str, library: &str) -> bool {
    match (app.trim().parse::<u32>(), library.trim().parse::<u32>()) {
        (Ok(app), Ok(library)) => app < library,
        (Ok(_), Err(_)) => true,
        (Err(_), Ok(_)) => false,
        (Err(_), Err(_)) => app != library,
    }
}
