use super::is_package_name;
use crate::merge::MergeContext;
use crate::model::{AttributeOperation, NodeKey, NodeOperation};
use crate::xml::{DocumentType, QName, SourceFilePosition, XmlDocument, XmlElement};
use tracing::debug;

/// Validate one loaded document.
///
/// Returns the document to merge, which differs from the input only when a
/// `split` attribute had to be dropped.
pub(crate) fn validate_document(doc: XmlDocument, namespace: Option<&str>, ctx: &mut MergeContext<'_>) -> XmlDocument {
    let before = ctx.records.len();
    check_element(doc.root(), ctx);

    if doc.doc_type() == DocumentType::Main {
        if let (Some(namespace), Some(attribute)) = (namespace, doc.root().attribute(&QName::local("package"))) {
            ctx.info(
                attribute.position(),
                format!(
                    "Setting the namespace via the package attribute in the source manifest is deprecated; \
                     the namespace {} is used for class names.\n\tSuggestion: remove package=\"{}\" from {}.",
                    namespace,
                    attribute.value(),
                    doc.source()
                ),
            );
        }
    }

    let doc = match doc.doc_type() {
        DocumentType::Main | DocumentType::Overlay => strip_split(doc, ctx),
        DocumentType::Library => doc,
    };
    debug!(
        "Validated {} {}: {} records",
        doc.doc_type(),
        doc.source(),
        ctx.records.len() - before
    );
    doc
}

fn strip_split(doc: XmlDocument, ctx: &mut MergeContext<'_>) -> XmlDocument {
    let mut root = doc.root().clone();
    match root.remove_attribute(&QName::local("split")) {
        Some(attribute) => {
            ctx.warning(
                attribute.position(),
                format!(
                    "Attribute 'split' was removed from {}. The Android Gradle plugin includes it for you when building your project.\n\
                     See https://d.android.com/r/studio-ui/dynamic-delivery/dynamic-feature-manifest for details.",
                    doc.source().file_name()
                ),
            );
            doc.with_root(root)
        }
        None => doc,
    }
}

fn check_element(element: &XmlElement, ctx: &mut MergeContext<'_>) {
    let position = element.position();
    match element.node_operation() {
        Err(value) => {
            let valid: Vec<&str> = NodeOperation::ALL.iter().map(NodeOperation::as_str).collect();
            ctx.error(
                position.clone(),
                format!(
                    "Invalid value for tools:node \"{}\" at {}. Valid values are: {}",
                    value,
                    position,
                    valid.join(", ")
                ),
            );
        }
        Ok(Some(NodeOperation::RemoveAll)) => {
            let key = ctx.model.key(element);
            if key.value().is_some() {
                ctx.error(
                    position.clone(),
                    format!(
                        "tools:node=\"removeAll\" cannot be used on {} at {} because it has a key; use tools:node=\"remove\" instead",
                        key, position
                    ),
                );
            }
        }
        Ok(_) => {}
    }

    let line = position
        .line()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());
    for name in element.attribute_operation_targets(AttributeOperation::Replace) {
        if element.attribute(&name).is_none() {
            ctx.error(
                position.clone(),
                format!(
                    "tools:replace specified at line:{} for attribute {}, but no new value specified",
                    line, name
                ),
            );
        }
    }

    if let Some(selector) = element.selector() {
        if !is_package_name(selector) {
            ctx.error(
                position.clone(),
                format!("tools:selector=\"{}\" at {} is not a valid package name", selector, position),
            );
        }
    }

    let mut seen: Vec<(NodeKey, SourceFilePosition)> = Vec::new();
    for child in element.child_elements() {
        let policy = ctx.model.policy(child.node_type());
        let key = ctx.model.key(child);
        if key.is_unifiable() && !policy.multiple_declarations_allowed && !child.is_removal_marker() {
            match seen.iter().find(|(k, _)| *k == key) {
                Some((_, first)) => ctx.error(
                    child.position(),
                    format!(
                        "Element {} at {} duplicated with element declared at {}",
                        key,
                        child.position(),
                        first
                    ),
                ),
                None => seen.push((key, child.position())),
            }
        }
        check_element(child, ctx);
    }
}

/// Selectors of high-priority documents must name a library package
pub(crate) fn validate_selectors<'d>(
    documents: impl IntoIterator<Item = &'d XmlDocument>,
    libraries: &[XmlDocument],
    ctx: &mut MergeContext<'_>,
) {
    let packages: Vec<&str> = libraries.iter().filter_map(XmlDocument::package).collect();
    for doc in documents {
        check_selectors(doc.root(), &packages, ctx);
    }
}

fn check_selectors(element: &XmlElement, packages: &[&str], ctx: &mut MergeContext<'_>) {
    if let Some(selector) = element.selector() {
        if is_package_name(selector) && !packages.contains(&selector) {
            ctx.error(
                element.position(),
                format!(
                    "tools:selector=\"{}\" is not a valid library identifier, valid identifiers are: {}",
                    selector,
                    packages.join(",")
                ),
            );
        }
    }
    for child in element.child_elements() {
        check_selectors(child, packages, ctx);
    }
}

/// Libraries may not share a package with each other or with the app
pub(crate) fn validate_unique_packages(
    main_package: Option<&str>,
    libraries: &[XmlDocument],
    ctx: &mut MergeContext<'_>,
) {
    let mut seen: Vec<(&str, String)> = Vec::new();
    if let Some(package) = main_package {
        seen.push((package, "the main manifest".to_string()));
    }
    for library in libraries {
        let Some(package) = library.package() else {
            continue;
        };
        match seen.iter().find(|(p, _)| *p == package) {
            Some((_, first)) => ctx.error(
                library.root().position(),
                format!("Package name '{}' used in: {}, {}.", package, first, library.source()),
            ),
            None => seen.push((package, library.source().to_string())),
        }
    }
}
