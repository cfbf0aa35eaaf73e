//! Integration tests for placeholder encoding and substitution

use manifest_merger::{
    Feature, InputSource, Invoker, KeyBasedValueResolver, MergeResult, MergeType, MergedManifestKind,
    PlaceholderEncoder, PlaceholderResolver, ResolverChain, Severity, SystemProperty,
};
use std::collections::{BTreeMap, HashMap};

const MAIN: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:label="${appLabel}">
        <provider android:name=".DataProvider" android:authorities="${applicationId}.provider"/>
        <activity android:name=".ArticleActivity">
            <intent-filter>
                <action android:name="android.intent.action.VIEW"/>
                <data android:scheme="https" android:host="${host}" android:pathPrefix="/${section}/"/>
            </intent-filter>
        </activity>
    </application>
</manifest>"#;

fn app() -> Invoker {
    Invoker::new(InputSource::text("main", MAIN), MergeType::Application)
}

#[test]
fn test_placeholders_are_substituted() {
    let report = app()
        .with_placeholders([("appLabel", "News"), ("host", "example.com"), ("section", "sports")])
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Success, "records: {:?}", report.records());
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:label=\"News\""));
    assert!(xml.contains("android:authorities=\"com.example.app.provider\""));
    assert!(xml.contains("android:host=\"example.com\""));
    assert!(xml.contains("android:pathPrefix=\"/sports/\""));
    assert!(!xml.contains("dollar_openBracket"));
}

#[test]
fn test_application_id_follows_package_override() {
    let report = app()
        .with_placeholders([("appLabel", "News"), ("host", "example.com"), ("section", "sports")])
        .with_override(SystemProperty::Package, "com.example.app.debug")
        .merge()
        .unwrap();

    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:authorities=\"com.example.app.debug.provider\""));
}

#[test]
fn test_missing_placeholder_in_main_is_error() {
    let report = app()
        .with_placeholders([("appLabel", "News"), ("section", "sports")])
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Error);
    let errors: Vec<&str> = report
        .records_with_severity(Severity::Error)
        .map(|r| r.message())
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Attribute data#"));
    assert!(errors[0].ends_with("requires a placeholder substitution but no value for <host> is provided."));
}

#[test]
fn test_missing_placeholder_in_library_is_warning() {
    let library = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <application>
        <meta-data android:name="com.example.lib.API_KEY" android:value="${apiKey}"/>
    </application>
</manifest>"#;
    let report = app()
        .add_library(InputSource::text("lib", library))
        .with_placeholders([("appLabel", "News"), ("host", "example.com"), ("section", "sports")])
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Warning);
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:value=\"${apiKey}\""));
}

#[test]
fn test_no_placeholder_replacement_keeps_placeholders() {
    let report = app()
        .with_feature(Feature::NoPlaceholderReplacement)
        .merge()
        .unwrap();

    assert_eq!(report.result(), MergeResult::Success, "records: {:?}", report.records());
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(xml.contains("android:host=\"${host}\""));
    assert!(xml.contains("android:pathPrefix=\"/${section}/\""), "encoded paths are decoded: {}", xml);
    assert!(report.is_aapt_safe_manifest_unchanged());
}

#[test]
fn test_aapt_safe_document_keeps_paths_encoded() {
    let report = app()
        .with_features([Feature::NoPlaceholderReplacement, Feature::MakeAaptSafe])
        .merge()
        .unwrap();

    assert!(!report.is_aapt_safe_manifest_unchanged());
    let safe = report.merged_document(MergedManifestKind::AaptSafe).unwrap();
    assert!(safe.contains("android:pathPrefix=\"/dollar_openBracket_section_closeBracket/\""));
    assert!(safe.contains("android:host=\"${host}\""), "only path attributes are encoded");
}

#[test]
fn test_encoder_and_resolver_round_trip() {
    let encoder = PlaceholderEncoder::new();
    let resolver = PlaceholderResolver::new();

    let encoded = encoder.encode("/${a}${b}/x");
    assert_eq!(encoded, "/dollar_openBracket_a_closeBracketdollar_openBracket_b_closeBracket/x");
    assert_eq!(resolver.decode(&encoded), "/${a}${b}/x");

    let values = HashMap::from([("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]);
    let (value, missing) = resolver.substitute(&encoded, &values);
    assert_eq!(value, "/12/x");
    assert!(missing.is_empty());
}

#[test]
fn test_resolver_chain_prefers_first_resolver() {
    let primary = BTreeMap::from([("host".to_string(), "primary.example.com".to_string())]);
    let fallback = BTreeMap::from([
        ("host".to_string(), "fallback.example.com".to_string()),
        ("port".to_string(), "8080".to_string()),
    ]);
    let chain = ResolverChain::new().with(&primary).with(&fallback);

    assert_eq!(chain.value("host").as_deref(), Some("primary.example.com"));
    assert_eq!(chain.value("port").as_deref(), Some("8080"));
    assert_eq!(chain.value("scheme"), None);

    let (value, missing) = PlaceholderResolver::new().substitute("${scheme}://${host}:${port}", &chain);
    assert_eq!(value, "${scheme}://primary.example.com:8080");
    assert_eq!(missing, vec!["scheme".to_string()]);
}
