//! Integration tests for pre-merge and post-merge validation

use manifest_merger::{
    validate_feature_name, Feature, InputSource, Invoker, MergeResult, MergeType, MergedManifestKind,
    MergingReport, Severity, SystemProperty,
};

fn app(main: &str) -> Invoker {
    Invoker::new(InputSource::text("AndroidManifest.xml", main), MergeType::Application)
}

fn messages(report: &MergingReport, severity: Severity) -> Vec<String> {
    report
        .records_with_severity(severity)
        .map(|r| r.message().to_string())
        .collect()
}

fn manifest(target_sdk: &str, exported: &str) -> String {
    format!(
        r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <uses-sdk android:minSdkVersion="21" android:targetSdkVersion="{}"/>
    <application>
        <activity android:name=".MainActivity" {}>
            <intent-filter>
                <action android:name="android.intent.action.MAIN"/>
                <category android:name="android.intent.category.LAUNCHER"/>
            </intent-filter>
        </activity>
    </application>
</manifest>"#,
        target_sdk, exported
    )
}

// ============================================================================
// Post-merge checks
// ============================================================================

#[test]
fn test_exported_required_when_targeting_31() {
    let report = app(&manifest("31", "")).merge().unwrap();

    assert_eq!(report.result(), MergeResult::Error);
    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with(
        "android:exported needs to be explicitly specified for element <activity#com.example.app.MainActivity>."
    ));
}

#[test]
fn test_explicit_exported_passes() {
    let report = app(&manifest("33", "android:exported=\"true\"")).merge().unwrap();
    assert_eq!(report.result(), MergeResult::Success, "records: {:?}", report.records());
}

#[test]
fn test_target_sdk_override_triggers_exported_check() {
    let report = app(&manifest("30", ""))
        .with_override(SystemProperty::TargetSdkVersion, "34")
        .merge()
        .unwrap();
    assert_eq!(report.result(), MergeResult::Error);
}

#[test]
fn test_package_needs_a_dot() {
    let report = app(r#"<manifest package="example"><application/></manifest>"#)
        .merge()
        .unwrap();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Package name 'example' at position AndroidManifest.xml:1:1-"));
}

#[test]
fn test_namespace_replaces_missing_package() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <activity android:name=".MainActivity"/>
    </application>
</manifest>"#;
    let missing = app(main).merge().unwrap();
    assert!(messages(&missing, Severity::Error)[0].starts_with("Missing 'package' key attribute on element manifest"));

    let report = app(main).with_namespace("com.example.app").merge().unwrap();
    assert_eq!(report.result(), MergeResult::Success, "records: {:?}", report.records());
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:name=\"com.example.app.MainActivity\""));
}

#[test]
fn test_package_with_namespace_is_info_only() {
    let report = app(r#"<manifest package="com.example.legacy"><application/></manifest>"#)
        .with_namespace("com.example.app")
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Success);
    let infos = messages(&report, Severity::Info);
    assert_eq!(infos.len(), 1);
    assert!(infos[0].contains("Suggestion: remove package=\"com.example.legacy\""));
}

// ============================================================================
// Pre-merge checks
// ============================================================================

#[test]
fn test_duplicate_declarations_are_errors() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <permission android:name="com.example.app.READ"/>
    <permission android:name="com.example.app.READ"/>
</manifest>"#;
    let report = app(main).merge().unwrap();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Element permission#com.example.app.READ at AndroidManifest.xml:3:5-"));
    assert!(errors[0].contains("duplicated with element declared at AndroidManifest.xml:2:5-"));
}

#[test]
fn test_replace_without_new_value_is_error() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools" package="com.example.app">
    <application tools:replace="android:icon"/>
</manifest>"#;
    let report = app(main).merge().unwrap();

    assert_eq!(
        messages(&report, Severity::Error),
        vec!["tools:replace specified at line:3 for attribute android:icon, but no new value specified".to_string()]
    );
}

#[test]
fn test_split_attribute_is_removed_with_warning() {
    let report = app(r#"<manifest package="com.example.app" split="feature"><application/></manifest>"#)
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Warning);
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(!xml.contains("split="));
}

#[test]
fn test_unique_package_names_enforced() {
    let library = r#"<manifest package="com.example.shared"/>"#;
    let report = app(r#"<manifest package="com.example.app"><application/></manifest>"#)
        .add_library(InputSource::text("first", library))
        .add_library(InputSource::text("second", library))
        .with_feature(Feature::EnforceUniquePackageName)
        .merge()
        .unwrap();

    assert_eq!(
        messages(&report, Severity::Error),
        vec!["Package name 'com.example.shared' used in: first, second.".to_string()]
    );
    assert!(report.merged_document(MergedManifestKind::Blame).is_none(), "merge stopped early");
}

#[test]
fn test_selector_must_name_a_library() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools" package="com.example.app">
    <uses-permission android:name="android.permission.INTERNET" tools:node="remove" tools:selector="com.example.missing"/>
</manifest>"#;
    let report = app(main)
        .add_library(InputSource::text("lib", r#"<manifest package="com.example.lib"/>"#))
        .merge()
        .unwrap();

    let errors = messages(&report, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("valid identifiers are: com.example.lib"));
}

// ============================================================================
// Injection checks
// ============================================================================

#[test]
fn test_existing_extract_native_libs_warns() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:extractNativeLibs="true"/>
</manifest>"#;
    let report = app(main)
        .with_override(SystemProperty::ExtractNativeLibs, "false")
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Warning);
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:extractNativeLibs=\"true\""));
}

#[test]
fn test_generated_locale_config_conflicts_with_existing() {
    let main = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:localeConfig="@xml/locales"/>
</manifest>"#;
    let report = app(main)
        .with_generated_locale_config("@xml/_generated_res_locale_config")
        .merge()
        .unwrap();
    assert_eq!(report.result(), MergeResult::Error);

    let report = app(r#"<manifest package="com.example.app"/>"#)
        .with_generated_locale_config("@xml/_generated_res_locale_config")
        .merge()
        .unwrap();
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:localeConfig=\"@xml/_generated_res_locale_config\""));
}

#[test]
fn test_dynamic_feature_attributes() {
    let report = app(r#"<manifest package="com.example.app"><application/></manifest>"#)
        .with_feature_name("camera")
        .unwrap()
        .with_feature(Feature::AddDynamicFeatureAttributes)
        .merge()
        .unwrap();

    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("split=\"camera\""));
    assert!(xml.contains("android:isFeatureSplit=\"true\""));
}

#[test]
fn test_required_feature_filters_library_elements() {
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools" package="com.example.lib">
    <application>
        <activity android:name=".CameraActivity" tools:requireFeature="camera"/>
        <activity android:name=".MapActivity" tools:requireFeature="maps"/>
    </application>
</manifest>"#;
    let report = app(r#"<manifest package="com.example.app"><application/></manifest>"#)
        .add_library(InputSource::text("lib", library))
        .with_feature_name("camera")
        .unwrap()
        .merge()
        .unwrap();

    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("com.example.lib.CameraActivity"));
    assert!(!xml.contains("MapActivity"));
    assert_eq!(messages(&report, Severity::Info).len(), 1);
}

#[test]
fn test_feature_names() {
    assert!(validate_feature_name("camera").is_ok());
    let err = validate_feature_name("9lives").unwrap_err();
    assert_eq!(err.to_string(), "FeatureName '9lives' is invalid: it must start with a letter");
    assert!(app("<manifest/>").with_feature_name("has space").is_err());
}
