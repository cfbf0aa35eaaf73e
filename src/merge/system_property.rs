//! Build-supplied values injected into the merged manifest

use super::context::MergeContext;
use super::{Feature, MergeType};
use crate::model::NodeType;
use crate::report::ActionType;
use crate::xml::{QName, XmlAttribute, XmlDocument, XmlElement, XmlNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const MULTIDEX_ANDROIDX: &str = "androidx.multidex.MultiDexApplication";
const MULTIDEX_SUPPORT: &str = "android.support.multidex.MultiDexApplication";
const INTERNET_PERMISSION: &str = "android.permission.INTERNET";

/// Manifest values the build can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemProperty {
    Package,
    VersionCode,
    VersionName,
    MinSdkVersion,
    TargetSdkVersion,
    MaxSdkVersion,
    ExtractNativeLibs,
}

impl SystemProperty {
    pub const ALL: [SystemProperty; 7] = [
        SystemProperty::Package,
        SystemProperty::VersionCode,
        SystemProperty::VersionName,
        SystemProperty::MinSdkVersion,
        SystemProperty::TargetSdkVersion,
        SystemProperty::MaxSdkVersion,
        SystemProperty::ExtractNativeLibs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemProperty::Package => "package",
            SystemProperty::VersionCode => "version_code",
            SystemProperty::VersionName => "version_name",
            SystemProperty::MinSdkVersion => "min_sdk_version",
            SystemProperty::TargetSdkVersion => "target_sdk_version",
            SystemProperty::MaxSdkVersion => "max_sdk_version",
            SystemProperty::ExtractNativeLibs => "extract_native_libs",
        }
    }

    /// Attribute the property writes
    pub fn attribute(&self) -> QName {
        match self {
            SystemProperty::Package => QName::local("package"),
            SystemProperty::VersionCode => QName::android("versionCode"),
            SystemProperty::VersionName => QName::android("versionName"),
            SystemProperty::MinSdkVersion => QName::android("minSdkVersion"),
            SystemProperty::TargetSdkVersion => QName::android("targetSdkVersion"),
            SystemProperty::MaxSdkVersion => QName::android("maxSdkVersion"),
            SystemProperty::ExtractNativeLibs => QName::android("extractNativeLibs"),
        }
    }

    /// Element the property lives on
    pub fn target(&self) -> NodeType {
        match self {
            SystemProperty::Package | SystemProperty::VersionCode | SystemProperty::VersionName => NodeType::Manifest,
            SystemProperty::MinSdkVersion | SystemProperty::TargetSdkVersion | SystemProperty::MaxSdkVersion => {
                NodeType::UsesSdk
            }
            SystemProperty::ExtractNativeLibs => NodeType::Application,
        }
    }
}

impl FromStr for SystemProperty {
    type Err = String;

    /// Accepts `min_sdk_version`, `MIN_SDK_VERSION`, `minSdkVersion` and `min-sdk-version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        SystemProperty::ALL
            .into_iter()
            .find(|p| p.as_str().replace('_', "") == normalized)
            .ok_or_else(|| format!("unknown system property '{}'", s))
    }
}

impl fmt::Display for SystemProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs to injection besides the features
pub(crate) struct Injection<'a> {
    pub(crate) overrides: &'a BTreeMap<SystemProperty, String>,
    pub(crate) feature_name: Option<&'a str>,
    pub(crate) locale_config: Option<&'a str>,
}

/// Write overrides and feature-driven attributes into the merged document
pub(crate) fn inject_system_properties(
    doc: &XmlDocument,
    injection: &Injection<'_>,
    ctx: &mut MergeContext<'_>,
) -> XmlDocument {
    let mut root = doc.root().clone();

    for property in [
        SystemProperty::Package,
        SystemProperty::VersionCode,
        SystemProperty::VersionName,
    ] {
        if let Some(value) = injection.overrides.get(&property) {
            inject_attribute(&mut root, property.attribute(), value, ctx);
        }
    }

    inject_sdk_versions(&mut root, injection.overrides, ctx);

    if ctx.merge_type == MergeType::Library {
        if let Some(uses_sdk) = root.child_of_type_mut(NodeType::UsesSdk) {
            uses_sdk.remove_attribute(&SystemProperty::TargetSdkVersion.attribute());
        }
    }

    let needs_application = ctx.merge_type == MergeType::Application
        || injection.overrides.contains_key(&SystemProperty::ExtractNativeLibs)
        || injection.locale_config.is_some()
        || [
            Feature::TestOnly,
            Feature::Debuggable,
            Feature::AddAndroidxMultidexApplicationIfNoName,
            Feature::AddSupportMultidexApplicationIfNoName,
        ]
        .into_iter()
        .any(|f| ctx.has(f));
    if needs_application {
        if root.child_of_type_mut(NodeType::Application).is_none() {
            let application = XmlElement::new(
                QName::local(NodeType::Application.tag_name()),
                NodeType::Application,
                root.origin().clone(),
            );
            root.push_child(application);
        }
        if let Some(application) = root.child_of_type_mut(NodeType::Application) {
            inject_application(application, injection, ctx);
        }
    }

    if ctx.has(Feature::AdvancedProfiling) {
        let present = root
            .children_of_type(NodeType::UsesPermission)
            .any(|p| p.android_attribute("name") == Some(INTERNET_PERMISSION));
        if !present {
            let mut permission = XmlElement::new(
                QName::local(NodeType::UsesPermission.tag_name()),
                NodeType::UsesPermission,
                root.origin().clone(),
            );
            permission.set_attribute(XmlAttribute::new(
                QName::android("name"),
                INTERNET_PERMISSION,
                root.origin().clone(),
                None,
            ));
            let key = ctx.model.key(&permission);
            ctx.actions
                .record_node(&key, ActionType::Injected, permission.position(), None);
            root.push_child(permission);
        }
    }

    if ctx.has(Feature::AddDynamicFeatureAttributes) {
        if let Some(feature_name) = injection.feature_name {
            inject_attribute(&mut root, QName::local("split"), feature_name, ctx);
            inject_attribute(&mut root, QName::android("isFeatureSplit"), "true", ctx);
        }
    }

    debug!("Injected system properties into {}", doc.source());
    doc.with_root(root)
}

fn inject_attribute(element: &mut XmlElement, name: QName, value: &str, ctx: &mut MergeContext<'_>) {
    let key = ctx.model.key(element);
    let attribute = XmlAttribute::new(name.clone(), value, element.origin().clone(), None);
    ctx.actions
        .record_attribute(&key, &name, ActionType::Injected, attribute.position(), None);
    element.set_attribute(attribute);
}

fn inject_sdk_versions(root: &mut XmlElement, overrides: &BTreeMap<SystemProperty, String>, ctx: &mut MergeContext<'_>) {
    let mut properties = vec![SystemProperty::MinSdkVersion, SystemProperty::MaxSdkVersion];
    if ctx.merge_type == MergeType::Application {
        properties.insert(1, SystemProperty::TargetSdkVersion);
    }
    let values: Vec<(SystemProperty, &String)> = properties
        .into_iter()
        .filter_map(|p| overrides.get(&p).map(|v| (p, v)))
        .collect();
    if values.is_empty() {
        return;
    }

    if root.child_of_type_mut(NodeType::UsesSdk).is_none() {
        let uses_sdk = XmlElement::new(
            QName::local(NodeType::UsesSdk.tag_name()),
            NodeType::UsesSdk,
            root.origin().clone(),
        );
        let key = ctx.model.key(&uses_sdk);
        ctx.actions
            .record_node(&key, ActionType::Injected, uses_sdk.position(), None);
        root.children.insert(0, XmlNode::Element(uses_sdk));
    }
    if let Some(uses_sdk) = root.child_of_type_mut(NodeType::UsesSdk) {
        for (property, value) in values {
            inject_attribute(uses_sdk, property.attribute(), value, ctx);
        }
    }
}

fn inject_application(application: &mut XmlElement, injection: &Injection<'_>, ctx: &mut MergeContext<'_>) {
    if let Some(value) = injection.overrides.get(&SystemProperty::ExtractNativeLibs) {
        let existing = application
            .attribute(&SystemProperty::ExtractNativeLibs.attribute())
            .map(XmlAttribute::position);
        match existing {
            Some(position) => ctx.warning(
                position,
                "android:extractNativeLibs should not be specified in this source AndroidManifest.xml file. \
                 The value is provided by the build configuration; remove the attribute to use it.",
            ),
            None => inject_attribute(application, SystemProperty::ExtractNativeLibs.attribute(), value, ctx),
        }
    }

    if ctx.has(Feature::TestOnly) {
        inject_attribute(application, QName::android("testOnly"), "true", ctx);
    }
    if ctx.has(Feature::Debuggable) {
        inject_attribute(application, QName::android("debuggable"), "true", ctx);
    }

    if application.android_attribute("name").is_none() {
        if ctx.has(Feature::AddAndroidxMultidexApplicationIfNoName) {
            inject_attribute(application, QName::android("name"), MULTIDEX_ANDROIDX, ctx);
        } else if ctx.has(Feature::AddSupportMultidexApplicationIfNoName) {
            inject_attribute(application, QName::android("name"), MULTIDEX_SUPPORT, ctx);
        }
    }

    if let Some(locale_config) = injection.locale_config {
        match application.attribute(&QName::android("localeConfig")).map(XmlAttribute::position) {
            Some(position) => ctx.error(
                position,
                "Locale config generation was requested but the manifest already sets android:localeConfig. \
                 Remove the attribute or disable locale config generation.",
            ),
            None => inject_attribute(application, QName::android("localeConfig"), locale_config, ctx),
        }
    }
}
