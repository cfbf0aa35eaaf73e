//! Integration tests for `<nav-graph>` expansion

use manifest_merger::{
    DeepLink, InputSource, Invoker, MergeFailure, MergeResult, MergeType, MergedManifestKind, NavigationXmlDocument,
    Severity,
};

const MAIN: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application>
        <activity android:name=".MainActivity">
            <nav-graph android:value="@navigation/main"/>
        </activity>
    </application>
</manifest>"#;

const NAVIGATION: &str = r#"[
  {
    "name": "main",
    "navigationXmlIds": ["settings"],
    "deepLinks": [
      {"schemes": ["https"], "host": "www.example.com", "port": -1, "path": "/item/{id}", "isAutoVerify": true}
    ]
  },
  {
    "name": "settings",
    "deepLinks": [
      {"schemes": ["app"], "host": ".*.example.com", "path": "/settings"},
      {"schemes": ["https"], "host": "www.example.com", "port": -1, "path": "/item/{id}", "isAutoVerify": true}
    ]
  }
]"#;

fn merge(main: &str, navigation: &str) -> manifest_merger::MergingReport {
    Invoker::new(InputSource::text("main", main), MergeType::Application)
        .add_navigation_json(InputSource::text("navigation.json", navigation))
        .merge()
        .unwrap()
}

#[test]
fn test_nav_graph_becomes_intent_filters() {
    let report = merge(MAIN, NAVIGATION);

    assert_eq!(report.result(), MergeResult::Success, "records: {:?}", report.records());
    let xml = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(!xml.contains("nav-graph"));
    assert_eq!(xml.matches("<intent-filter").count(), 2, "duplicate deep links collapse: {}", xml);
    assert!(xml.contains("<intent-filter android:autoVerify=\"true\">"));
    assert!(xml.contains("<data android:pathPrefix=\"/item/\" />"));
    assert!(xml.contains("<data android:host=\"*.example.com\" />"));
    assert!(xml.contains("<data android:scheme=\"app\" />"));
    assert!(xml.contains("<data android:path=\"/settings\" />"));
    assert!(xml.contains("<category android:name=\"android.intent.category.BROWSABLE\" />"));
}

#[test]
fn test_unknown_navigation_file_is_error() {
    let report = merge(MAIN, "[]");

    assert_eq!(report.result(), MergeResult::Error);
    let errors: Vec<&str> = report
        .records_with_severity(Severity::Error)
        .map(|r| r.message())
        .collect();
    assert_eq!(errors, vec!["Referenced navigation file with navigationXmlId = main not found"]);
}

#[test]
fn test_circular_navigation_is_error() {
    let navigation = r#"[
        {"name": "main", "navigationXmlIds": ["settings"]},
        {"name": "settings", "navigationXmlIds": ["main"]}
    ]"#;
    let report = merge(MAIN, navigation);

    let errors: Vec<&str> = report
        .records_with_severity(Severity::Error)
        .map(|r| r.message())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Illegal circular reference among navigation files when traversing navigation file references: \
             main > settings > main."
        ]
    );
}

#[test]
fn test_malformed_navigation_json_is_failure() {
    let result = Invoker::new(InputSource::text("main", MAIN), MergeType::Application)
        .add_navigation_json(InputSource::text("navigation.json", "{not json"))
        .merge();

    match result {
        Err(err @ MergeFailure::Navigation { .. }) => {
            assert!(err.to_string().starts_with("Error parsing navigation json navigation.json"))
        }
        other => panic!("expected navigation failure, got {:?}", other.map(|r| r.result())),
    }
}

#[test]
fn test_navigation_json_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("navigation.json");
    std::fs::write(&path, NAVIGATION).unwrap();

    let report = Invoker::new(InputSource::text("main", MAIN), MergeType::Application)
        .add_navigation_json(InputSource::file(&path))
        .merge()
        .unwrap();
    assert_eq!(report.result(), MergeResult::Success);
}

#[test]
fn test_library_merge_keeps_nav_graph_out_of_aapt_safe_document() {
    let report = Invoker::new(InputSource::text("main", MAIN), MergeType::Library)
        .merge()
        .unwrap();

    let merged = report.merged_document(MergedManifestKind::Merged).unwrap();
    assert!(merged.contains("<nav-graph android:value=\"@navigation/main\" />"));
    assert!(!report.is_aapt_safe_manifest_unchanged());
    let safe = report.merged_document(MergedManifestKind::AaptSafe).unwrap();
    assert!(!safe.contains("nav-graph"));
}

#[test]
fn test_navigation_documents_deserialize_with_defaults() {
    let documents: Vec<NavigationXmlDocument> =
        serde_json::from_str(r#"[{"name": "main", "deepLinks": [{"path": "/home"}]}]"#).unwrap();

    assert_eq!(documents[0].navigation_xml_ids, Vec::<String>::new());
    assert_eq!(
        documents[0].deep_links[0],
        DeepLink {
            schemes: vec![],
            host: None,
            port: -1,
            path: "/home".to_string(),
            query: None,
            fragment: None,
            is_auto_verify: false,
            action: None,
            mime_type: None,
        }
    );
}
