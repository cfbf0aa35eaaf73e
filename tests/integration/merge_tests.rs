//! Integration tests for manifest merging
//!
//! These tests drive the complete pipeline through `Invoker` with
//! in-memory manifests.

use manifest_merger::{
    ActionType, Feature, InputSource, Invoker, MergeFailure, MergeResult, MergeType, MergedManifestKind,
    MergingReport, Severity, SystemProperty,
};

const MAIN: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools"
    package="com.example.app">
    <uses-sdk android:minSdkVersion="21" android:targetSdkVersion="30"/>
    <uses-permission android:name="android.permission.CAMERA"/>
    <application android:label="@string/app_name" android:hasCode="false">
        <activity android:name=".MainActivity">
            <intent-filter>
                <action android:name="android.intent.action.MAIN"/>
                <category android:name="android.intent.category.LAUNCHER"/>
            </intent-filter>
        </activity>
    </application>
</manifest>"#;

const LIBRARY: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.lib">
    <uses-sdk android:minSdkVersion="19"/>
    <uses-permission android:name="android.permission.INTERNET"/>
    <uses-permission android:name="android.permission.CAMERA"/>
    <application android:hasCode="true">
        <activity android:name=".LibActivity"/>
        <service android:name="com.example.lib.SyncService"/>
    </application>
</manifest>"#;

fn app(main: &str) -> Invoker {
    Invoker::new(InputSource::text("main", main), MergeType::Application)
}

fn merged(report: &MergingReport) -> &str {
    report
        .merged_document(MergedManifestKind::Merged)
        .unwrap_or_else(|| panic!("no merged document, records: {:?}", report.records()))
}

fn messages(report: &MergingReport, severity: Severity) -> Vec<String> {
    report
        .records_with_severity(severity)
        .map(|r| r.message().to_string())
        .collect()
}

// ============================================================================
// Basic merging
// ============================================================================

#[test]
fn test_main_only_merge_succeeds() {
    let report = app(MAIN).merge().unwrap();

    assert_eq!(report.result(), MergeResult::Success);
    let xml = merged(&report);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<manifest"));
    assert!(xml.contains("android:name=\"com.example.app.MainActivity\""));
    assert!(!xml.contains("xmlns:tools"), "tools namespace is stripped");
    assert_eq!(report.package_name(), Some("com.example.app"));
    assert!(report.merged_document(MergedManifestKind::Blame).is_some());
}

#[test]
fn test_library_elements_are_added() {
    let report = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    let xml = merged(&report);
    assert!(xml.contains("android.permission.INTERNET"));
    assert!(xml.contains("com.example.lib.LibActivity"));
    assert!(xml.contains("com.example.lib.SyncService"));
    assert_eq!(xml.matches("android.permission.CAMERA").count(), 1, "keys stay unique");

    // Main elements stay ahead of library additions
    let main_activity = xml.find("MainActivity").unwrap();
    let lib_activity = xml.find("LibActivity").unwrap();
    assert!(main_activity < lib_activity);
}

#[test]
fn test_has_code_is_ored_with_overlays() {
    let overlay = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:hasCode="true"/>
</manifest>"#;
    let report = app(MAIN)
        .add_overlay(InputSource::text("overlay", overlay))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    assert!(merged(&report).contains("android:hasCode=\"true\""));
}

#[test]
fn test_library_has_code_is_ignored() {
    let report = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();

    assert!(merged(&report).contains("android:hasCode=\"false\""));
    let decisions = report.actions().attribute_records("application", "android:hasCode");
    assert!(decisions.iter().any(|d| d.action_type == ActionType::Ignored));
}

#[test]
fn test_library_uses_sdk_is_not_merged() {
    let report = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(xml.contains("android:minSdkVersion=\"21\""));
    assert!(!xml.contains("android:minSdkVersion=\"19\""));
}

#[test]
fn test_merge_is_idempotent() {
    let alone = app(MAIN).merge().unwrap();
    let with_itself = app(MAIN)
        .add_library(InputSource::text("lib", MAIN))
        .merge()
        .unwrap();

    assert!(with_itself.result().is_success(), "records: {:?}", with_itself.records());
    assert_eq!(merged(&with_itself), merged(&alone));
}

#[test]
fn test_merged_output_is_stable_when_remerged() {
    let first = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();
    let once = merged(&first).to_string();

    let second = app(&once).merge().unwrap();
    assert_eq!(merged(&second), once);
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn test_main_attribute_conflict_with_library_is_error() {
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <application android:label="@string/lib_name"/>
</manifest>"#;
    let report = app(MAIN)
        .add_library(InputSource::text("lib", library))
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Error);
    assert!(report.merged_document(MergedManifestKind::Merged).is_none());
    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Attribute application@android:label value=(@string/app_name) from main:"));
    assert!(errors[0].contains("Suggestion: add 'tools:replace=\"android:label\"' to <application> element"));
}

#[test]
fn test_tools_replace_resolves_conflict() {
    let main = MAIN.replace(
        "<application android:label",
        "<application tools:replace=\"android:label\" android:label",
    );
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <application android:label="@string/lib_name"/>
</manifest>"#;
    let report = app(&main)
        .add_library(InputSource::text("lib", library))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    let xml = merged(&report);
    assert!(xml.contains("android:label=\"@string/app_name\""));
    assert!(!xml.contains("tools:replace"));

    let decisions = report.actions().attribute_records("application", "android:label");
    assert!(decisions.iter().any(|d| d.action_type == ActionType::Rejected));
}

#[test]
fn test_automatic_conflict_handling_keeps_higher_value() {
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <application android:label="@string/lib_name"/>
</manifest>"#;
    let report = app(MAIN)
        .add_library(InputSource::text("lib", library))
        .with_feature(Feature::HandleValueConflictsAutomatically)
        .merge()
        .unwrap();

    assert!(report.result().is_success());
    assert!(merged(&report).contains("android:label=\"@string/app_name\""));
}

#[test]
fn test_overlay_beats_main_and_later_overlay_beats_earlier() {
    let overlay = |label: &str| {
        format!(
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" xmlns:tools="http://schemas.android.com/tools">
    <application android:label="{}" tools:replace="android:label"/>
</manifest>"#,
            label
        )
    };
    let report = app(MAIN)
        .add_overlay(InputSource::text("debug", overlay("@string/debug_name")))
        .add_overlay(InputSource::text("flavor", overlay("@string/flavor_name")))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    assert!(merged(&report).contains("android:label=\"@string/flavor_name\""));
}

#[test]
fn test_earlier_library_beats_later_library() {
    let library = |package: &str, theme: &str| {
        format!(
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="{}">
    <application>
        <meta-data android:name="shared.key" android:value="{}"/>
    </application>
</manifest>"#,
            package, theme
        )
    };
    let report = app(MAIN)
        .add_library(InputSource::text("first", library("com.example.first", "first")))
        .add_library(InputSource::text("second", library("com.example.second", "second")))
        .with_feature(Feature::HandleValueConflictsAutomatically)
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(xml.contains("android:value=\"first\""));
    assert!(!xml.contains("android:value=\"second\""));
}

// ============================================================================
// Node operations
// ============================================================================

#[test]
fn test_remove_marker_rejects_library_element() {
    let main = MAIN.replace(
        "<uses-permission android:name=\"android.permission.CAMERA\"/>",
        "<uses-permission android:name=\"android.permission.CAMERA\"/>\n    \
         <uses-permission android:name=\"android.permission.INTERNET\" tools:node=\"remove\"/>",
    );
    let report = app(&main)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    assert!(!merged(&report).contains("android.permission.INTERNET"));
    assert!(report
        .actions()
        .has_rejection("uses-permission#android.permission.INTERNET"));
}

#[test]
fn test_unused_remove_marker_warns() {
    let main = MAIN.replace(
        "<uses-permission android:name=\"android.permission.CAMERA\"/>",
        "<uses-permission android:name=\"android.permission.READ_CONTACTS\" tools:node=\"remove\"/>",
    );
    let report = app(&main).merge().unwrap();

    assert_eq!(report.result(), MergeResult::Warning);
    let warnings = messages(&report, Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with(
        "uses-permission#android.permission.READ_CONTACTS was tagged at main:5 to remove other declarations"
    ));
}

#[test]
fn test_remove_all_drops_every_library_permission() {
    let main = MAIN.replace(
        "<uses-permission android:name=\"android.permission.CAMERA\"/>",
        "<uses-permission tools:node=\"removeAll\"/>",
    );
    let report = app(&main)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(!xml.contains("uses-permission"), "merged: {}", xml);
}

#[test]
fn test_selector_limits_removal_to_one_library() {
    let main = MAIN.replace(
        "<uses-permission android:name=\"android.permission.CAMERA\"/>",
        "<uses-permission android:name=\"android.permission.INTERNET\" tools:node=\"remove\" tools:selector=\"com.example.other\"/>",
    );
    let other = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.other">
    <uses-permission android:name="android.permission.INTERNET"/>
</manifest>"#;
    let report = app(&main)
        .add_library(InputSource::text("lib", LIBRARY))
        .add_library(InputSource::text("other", other))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    // com.example.lib still contributes the permission
    assert!(merged(&report).contains("android.permission.INTERNET"));
}

// ============================================================================
// System properties and features
// ============================================================================

#[test]
fn test_overrides_are_injected() {
    let report = app(MAIN)
        .with_override(SystemProperty::Package, "com.example.release")
        .with_override(SystemProperty::VersionCode, "42")
        .with_override(SystemProperty::MinSdkVersion, "23")
        .with_feature(Feature::Debuggable)
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(xml.contains("package=\"com.example.release\""));
    assert!(xml.contains("android:versionCode=\"42\""));
    assert!(xml.contains("android:minSdkVersion=\"23\""));
    assert!(xml.contains("android:debuggable=\"true\""));
    // Class names were qualified with the original package before the override
    assert!(xml.contains("com.example.app.MainActivity"));

    let decisions = report.actions().attribute_records("manifest", "android:versionCode");
    assert_eq!(decisions[0].action_type, ActionType::Injected);
}

#[test]
fn test_library_merge_keeps_tools_and_drops_target_sdk() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools" package="com.example.lib">
    <uses-sdk android:minSdkVersion="21" android:targetSdkVersion="33"/>
    <uses-permission android:name="android.permission.WAKE_LOCK" tools:node="remove"/>
</manifest>"#;
    let report = Invoker::new(InputSource::text("main", main), MergeType::Library)
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(xml.contains("tools:node=\"remove\""));
    assert!(!xml.contains("targetSdkVersion"));
    assert!(!xml.contains("<application"), "library merges add no application");
}

#[test]
fn test_libraries_cannot_merge_into_library() {
    let result = Invoker::new(InputSource::text("main", MAIN), MergeType::Library)
        .add_library(InputSource::text("lib", LIBRARY))
        .merge();

    assert!(matches!(result, Err(MergeFailure::Invocation(_))));
}

#[test]
fn test_extract_fqcns_shortens_names_in_namespace() {
    let report = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .with_feature(Feature::ExtractFqcns)
        .merge()
        .unwrap();

    let xml = merged(&report);
    assert!(xml.contains("android:name=\".MainActivity\""));
    assert!(xml.contains("android:name=\"com.example.lib.LibActivity\""));
}

#[test]
fn test_intermediary_stages_are_kept() {
    let report = app(MAIN)
        .add_library(InputSource::text("lib", LIBRARY))
        .with_feature(Feature::KeepIntermediaryStages)
        .merge()
        .unwrap();

    assert_eq!(report.intermediary_stages().len(), 1);
    assert!(report.intermediary_stages()[0].contains("LibActivity"));
}

#[test]
fn test_keep_going_collects_every_error() {
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <uses-sdk android:minSdkVersion="26"/>
    <application android:label="@string/lib_name"/>
</manifest>"#;
    let report = app(MAIN)
        .add_library(InputSource::text("lib", library))
        .with_feature(Feature::KeepGoingAfterErrors)
        .merge()
        .unwrap();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 2, "errors: {:?}", errors);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("uses-sdk:minSdkVersion 21 cannot be smaller than version 26")));
    assert!(report.merged_document(MergedManifestKind::Merged).is_none());
    assert!(report.merged_document(MergedManifestKind::Blame).is_some());
}

#[test]
fn test_override_library_allows_newer_library() {
    let main = MAIN.replace(
        "<uses-sdk android:minSdkVersion=\"21\"",
        "<uses-sdk tools:overrideLibrary=\"com.example.lib\" android:minSdkVersion=\"21\"",
    );
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <uses-sdk android:minSdkVersion="26"/>
</manifest>"#;
    let report = app(&main)
        .add_library(InputSource::text("lib", library))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
}

#[test]
fn test_parse_failure_is_reported_as_error() {
    let result = app("<manifest><application></manifest>").merge();

    match result {
        Err(err @ MergeFailure::Parse { .. }) => assert!(err.to_string().starts_with("Error parsing main")),
        other => panic!("expected parse failure, got {:?}", other.map(|r| r.result())),
    }
}

// ============================================================================
// Dist modules
// ============================================================================

#[test]
fn test_overlay_dist_module_is_merged() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:hasCode="false"/>
</manifest>"#;
    let overlay = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:dist="http://schemas.android.com/apk/distribution" package="com.example.app">
    <dist:module dist:onDemand="true">
        <dist:fusing dist:include="true"/>
    </dist:module>
    <application android:hasCode="true"/>
</manifest>"#;
    let report = app(main)
        .add_overlay(InputSource::text("overlay", overlay))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    let xml = merged(&report);
    assert!(xml.contains("<dist:module dist:onDemand=\"true\">"), "{}", xml);
    assert!(xml.contains("<dist:fusing dist:include=\"true\" />"), "{}", xml);
    assert!(xml.contains("android:hasCode=\"true\""));
}

#[test]
fn test_library_dist_module_is_not_merged() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:dist="http://schemas.android.com/apk/distribution" package="com.example.app">
    <dist:module dist:instant="false"/>
    <application/>
</manifest>"#;
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:dist="http://schemas.android.com/apk/distribution" package="com.example.feature">
    <dist:module dist:instant="true">
        <dist:fusing dist:include="true"/>
    </dist:module>
</manifest>"#;
    let report = app(main)
        .add_library(InputSource::text("feature", library))
        .merge()
        .unwrap();

    assert!(report.result().is_success(), "records: {:?}", report.records());
    let xml = merged(&report);
    assert!(xml.contains("dist:instant=\"false\""));
    assert!(!xml.contains("dist:fusing"));
}
