use crate::merge::{MergeContext, MergeType};
use crate::model::NodeType;
use crate::xml::{QName, XmlDocument, XmlElement};

/// First API level that requires explicit `android:exported`
const EXPLICIT_EXPORT_SDK: u32 = 31;

/// Validate the merged document
pub(crate) fn validate_merged(doc: &XmlDocument, namespace: Option<&str>, ctx: &mut MergeContext<'_>) {
    if ctx.merge_type == MergeType::Application {
        check_package(doc, namespace, ctx);
    }
    if requires_explicit_export(doc) {
        check_exported(doc.root(), ctx);
    }
}

fn check_package(doc: &XmlDocument, namespace: Option<&str>, ctx: &mut MergeContext<'_>) {
    match doc.root().attribute(&QName::local("package")) {
        Some(attribute) => {
            let package = attribute.value();
            if !package.contains('.') && !package.contains("${") {
                ctx.error(
                    attribute.position(),
                    format!(
                        "Package name '{}' at position {} should contain at least one '.' (dot) character",
                        package,
                        attribute.position()
                    ),
                );
            }
        }
        None if namespace.is_none() => {
            let position = doc.root().position();
            ctx.error(
                position.clone(),
                format!("Missing 'package' key attribute on element manifest at {}", position),
            );
        }
        None => {}
    }
}

/// Whether the target SDK is 31 or later. Codenames count as the newest.
fn requires_explicit_export(doc: &XmlDocument) -> bool {
    let Some(uses_sdk) = doc.root().children_of_type(NodeType::UsesSdk).next() else {
        return false;
    };
    let target = uses_sdk
        .android_attribute("targetSdkVersion")
        .or_else(|| uses_sdk.android_attribute("minSdkVersion"));
    match target.map(|t| t.trim().parse::<u32>()) {
        Some(Ok(level)) => level >= EXPLICIT_EXPORT_SDK,
        Some(Err(_)) => true,
        None => false,
    }
}

fn check_exported(element: &XmlElement, ctx: &mut MergeContext<'_>) {
    let needs_exported = element.node_type().requires_explicit_export()
        && !element.is_removal_marker()
        && element.android_attribute("exported").is_none()
        && element
            .children_of_type(NodeType::IntentFilter)
            .any(|f| !f.is_removal_marker());
    if needs_exported {
        let key = ctx.model.key(element);
        ctx.error(
            element.position(),
            format!(
                "android:exported needs to be explicitly specified for element <{}>. Apps targeting Android 12 and higher \
                 are required to specify an explicit value for `android:exported` when the corresponding component \
                 has an intent filter defined. See https://developer.android.com/guide/topics/manifest/activity-element#exported for details.",
                key
            ),
        );
    }
    for child in element.child_elements() {
        check_exported(child, ctx);
    }
}
