use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of artifact being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeType {
    /// Final application manifest: tools directives are consumed and stripped
    #[default]
    Application,
    /// Library manifest: directives are kept for downstream merges
    Library,
}

impl MergeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeType::Application => "application",
            MergeType::Library => "library",
        }
    }
}

impl FromStr for MergeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(MergeType::Application),
            "library" | "lib" => Ok(MergeType::Library),
            other => Err(format!("unknown merge type '{}', expected application or library", other)),
        }
    }
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional merge behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Contract class names under the namespace to `.Name`
    ExtractFqcns,
    /// Strip tools directives and the tools namespace from the output
    RemoveToolsDeclarations,
    /// Let the higher-priority value win attribute conflicts silently
    HandleValueConflictsAutomatically,
    /// Leave `${...}` placeholders untouched
    NoPlaceholderReplacement,
    /// Encode placeholders and fix the package in the AAPT-safe document
    MakeAaptSafe,
    /// Skip the library minSdkVersion check
    DisableMinsdklibraryCheck,
    /// Fail when two libraries share a package
    EnforceUniquePackageName,
    /// Mark the application `android:testOnly`
    TestOnly,
    /// Mark the application `android:debuggable`
    Debuggable,
    /// Add the INTERNET permission needed by profilers
    AdvancedProfiling,
    /// Keep merging after an error to collect every problem
    KeepGoingAfterErrors,
    /// Keep a serialized copy of the document after each step
    KeepIntermediaryStages,
    /// Use the androidx multidex application when none is named
    AddAndroidxMultidexApplicationIfNoName,
    /// Use the support-library multidex application when none is named
    AddSupportMultidexApplicationIfNoName,
    /// Add `split` and `android:isFeatureSplit` for a dynamic feature
    AddDynamicFeatureAttributes,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::ExtractFqcns,
        Feature::RemoveToolsDeclarations,
        Feature::HandleValueConflictsAutomatically,
        Feature::NoPlaceholderReplacement,
        Feature::MakeAaptSafe,
        Feature::DisableMinsdklibraryCheck,
        Feature::EnforceUniquePackageName,
        Feature::TestOnly,
        Feature::Debuggable,
        Feature::AdvancedProfiling,
        Feature::KeepGoingAfterErrors,
        Feature::KeepIntermediaryStages,
        Feature::AddAndroidxMultidexApplicationIfNoName,
        Feature::AddSupportMultidexApplicationIfNoName,
        Feature::AddDynamicFeatureAttributes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ExtractFqcns => "extract_fqcns",
            Feature::RemoveToolsDeclarations => "remove_tools_declarations",
            Feature::HandleValueConflictsAutomatically => "handle_value_conflicts_automatically",
            Feature::NoPlaceholderReplacement => "no_placeholder_replacement",
            Feature::MakeAaptSafe => "make_aapt_safe",
            Feature::DisableMinsdklibraryCheck => "disable_minsdklibrary_check",
            Feature::EnforceUniquePackageName => "enforce_unique_package_name",
            Feature::TestOnly => "test_only",
            Feature::Debuggable => "debuggable",
            Feature::AdvancedProfiling => "advanced_profiling",
            Feature::KeepGoingAfterErrors => "keep_going_after_errors",
            Feature::KeepIntermediaryStages => "keep_intermediary_stages",
            Feature::AddAndroidxMultidexApplicationIfNoName => "add_androidx_multidex_application_if_no_name",
            Feature::AddSupportMultidexApplicationIfNoName => "add_support_multidex_application_if_no_name",
            Feature::AddDynamicFeatureAttributes => "add_dynamic_feature_attributes",
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    /// Accepts `extract_fqcns`, `EXTRACT_FQCNS` and `extract-fqcns`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| format!("unknown feature '{}'", s))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
