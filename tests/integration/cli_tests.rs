//! CLI integration tests
//!
//! These tests run the binary against manifests written to a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MAIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <application android:label="${appName}">
        <activity android:name=".MainActivity"/>
    </application>
</manifest>
"#;

const LIBRARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib">
    <uses-permission android:name="android.permission.INTERNET"/>
    <application>
        <service android:name=".SyncService"/>
    </application>
</manifest>
"#;

const CONFLICTING_LIBRARY: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.theme">
    <application android:label="Theme"/>
</manifest>
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn merger() -> Command {
    Command::cargo_bin("manifest-merger").unwrap()
}

fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "AndroidManifest.xml", MAIN);
    let library = write(dir.path(), "library.xml", LIBRARY);
    (dir, main, library)
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    merger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--library"))
        .stdout(predicate::str::contains("--placeholder"));
}

#[test]
fn test_version() {
    merger()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("manifest-merger"));
}

#[test]
fn test_missing_main_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    merger().current_dir(dir.path()).assert().failure();
}

#[test]
fn test_invalid_placeholder_argument() {
    merger()
        .args(["AndroidManifest.xml", "-p", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_merge_to_stdout() {
    let (_dir, main, library) = workspace();

    merger()
        .arg(&main)
        .arg("--library")
        .arg(&library)
        .args(["-p", "appName=Example", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("android:label=\"Example\""))
        .stdout(predicate::str::contains("com.example.lib.SyncService"))
        .stdout(predicate::str::contains("android.permission.INTERNET"));
}

#[test]
fn test_merge_writes_output_files() {
    let (dir, main, library) = workspace();
    let out = dir.path().join("build/merged.xml");
    let blame = dir.path().join("build/blame.xml");

    merger()
        .arg(&main)
        .arg("-l")
        .arg(&library)
        .args(["-p", "appName=Example", "--override", "min_sdk_version=24"])
        .arg("--out")
        .arg(&out)
        .arg("--blame-out")
        .arg(&blame)
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    let merged = std::fs::read_to_string(&out).unwrap();
    assert!(merged.starts_with("<?xml"));
    assert!(merged.contains("android:minSdkVersion=\"24\""));

    let blame = std::fs::read_to_string(&blame).unwrap();
    assert!(blame.contains("INJECTED from"));
    assert!(blame.contains("ADDED from"));
}

#[test]
fn test_conflict_fails_with_message() {
    let (dir, main, _) = workspace();
    let library = write(dir.path(), "theme.xml", CONFLICTING_LIBRARY);
    let out = dir.path().join("merged.xml");

    merger()
        .arg(&main)
        .arg("-l")
        .arg(&library)
        .args(["-p", "appName=Example"])
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stdout(predicate::str::contains("is also present at"))
        .stderr(predicate::str::contains("Manifest merger failed with 1 error"));

    assert!(!out.exists(), "no merged manifest on error");
}

#[test]
fn test_library_merge_keeps_tools_directives() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(
        dir.path(),
        "AndroidManifest.xml",
        r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools" package="com.example.lib">
    <application android:label="Lib" tools:replace="android:label"/>
</manifest>"#,
    );

    merger()
        .arg(&main)
        .args(["--merge-type", "library", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tools:replace=\"android:label\""));
}

// ============================================================================
// Output Format Tests
// ============================================================================

#[test]
fn test_json_report() {
    let (dir, main, library) = workspace();
    let out = dir.path().join("merged.xml");
    let report = dir.path().join("report.json");

    merger()
        .arg(&main)
        .arg("-l")
        .arg(&library)
        .args(["-p", "appName=Example", "--format", "json"])
        .arg("-o")
        .arg(&out)
        .arg("--report-out")
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["result"], "SUCCESS");
    assert_eq!(json["package_name"], "com.example.app");
    assert_eq!(json["documents"]["merged"], true);
    let keys: Vec<&str> = json["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["key"].as_str())
        .collect();
    assert!(keys.contains(&"uses-permission#android.permission.INTERNET"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file() {
    let (dir, _, _) = workspace();
    write(
        dir.path(),
        "merge.yml",
        r#"main: AndroidManifest.xml
libraries:
  - library.xml
placeholders:
  appName: Configured
overrides:
  version_code: "42"
features:
  - extract_fqcns
output:
  merged: out/AndroidManifest.xml
"#,
    );

    merger()
        .arg("--config")
        .arg(dir.path().join("merge.yml"))
        .assert()
        .success();

    let merged = std::fs::read_to_string(dir.path().join("out/AndroidManifest.xml")).unwrap();
    assert!(merged.contains("android:label=\"Configured\""));
    assert!(merged.contains("android:versionCode=\"42\""));
    assert!(merged.contains("android:name=\".MainActivity\""));
}

#[test]
fn test_cli_flags_override_config() {
    let (dir, main, _) = workspace();
    write(
        dir.path(),
        ".manifest-merger.toml",
        r#"[placeholders]
appName = "FromConfig"
"#,
    );

    merger()
        .arg(&main)
        .args(["-p", "appName=FromFlag", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("android:label=\"FromFlag\""));
}
