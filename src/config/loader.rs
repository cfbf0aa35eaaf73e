use crate::merge::{Feature, InputSource, Invoker, MergeType, SystemProperty};
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for one manifest merge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kind of artifact being produced: application or library
    pub merge_type: MergeType,

    /// Main manifest
    pub main: Option<PathBuf>,

    /// Overlay manifests, lowest priority first
    pub overlays: Vec<PathBuf>,

    /// Library manifests, highest priority first
    pub libraries: Vec<PathBuf>,

    /// Navigation JSON files used to expand `<nav-graph>`
    pub navigation_jsons: Vec<PathBuf>,

    /// Values for `${...}` placeholders
    pub placeholders: BTreeMap<String, String>,

    /// System property overrides
    pub overrides: SystemOverrides,

    /// Optional merge behaviours
    pub features: Vec<Feature>,

    /// Namespace used for class names when the main manifest has no package
    pub namespace: Option<String>,

    /// Name of the dynamic feature being merged
    pub feature_name: Option<String>,

    /// Feature names this module depends on
    pub dependency_feature_names: Vec<String>,

    /// Generated locale config resource, e.g. `@xml/_generated_res_locale_config`
    pub locale_config: Option<String>,

    /// Where results go
    pub output: OutputConfig,
}

/// Values written over whatever the merged manifest declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemOverrides {
    pub package: Option<String>,
    pub version_code: Option<String>,
    pub version_name: Option<String>,
    pub min_sdk_version: Option<String>,
    pub target_sdk_version: Option<String>,
    pub max_sdk_version: Option<String>,
    pub extract_native_libs: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Merged manifest path; printed to stdout when unset
    pub merged: Option<PathBuf>,

    /// Merged manifest annotated with provenance comments
    pub blame: Option<PathBuf>,

    /// AAPT-safe variant, written only when it differs from the merged manifest
    pub aapt_safe: Option<PathBuf>,

    /// Report file, for the json format
    pub report: Option<PathBuf>,

    /// Report format: terminal, json
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            merged: None,
            blame: None,
            aapt_safe: None,
            report: None,
            format: "terminal".to_string(),
        }
    }
}

impl SystemOverrides {
    fn slot(&mut self, property: SystemProperty) -> &mut Option<String> {
        match property {
            SystemProperty::Package => &mut self.package,
            SystemProperty::VersionCode => &mut self.version_code,
            SystemProperty::VersionName => &mut self.version_name,
            SystemProperty::MinSdkVersion => &mut self.min_sdk_version,
            SystemProperty::TargetSdkVersion => &mut self.target_sdk_version,
            SystemProperty::MaxSdkVersion => &mut self.max_sdk_version,
            SystemProperty::ExtractNativeLibs => &mut self.extract_native_libs,
        }
    }

    pub fn set(&mut self, property: SystemProperty, value: impl Into<String>) {
        *self.slot(property) = Some(value.into());
    }

    /// Overrides that are set, in declaration order
    pub fn entries(&self) -> Vec<(SystemProperty, String)> {
        let mut overrides = self.clone();
        SystemProperty::ALL
            .into_iter()
            .filter_map(|p| overrides.slot(p).take().map(|v| (p, v)))
            .collect()
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML).
    ///
    /// Relative input and output paths are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config")?,
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config")?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")?
                }
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".manifest-merger.yml",
            ".manifest-merger.yaml",
            ".manifest-merger.toml",
            "manifest-merger.yml",
            "manifest-merger.yaml",
            "manifest-merger.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.main.iter_mut().for_each(resolve);
        self.overlays.iter_mut().for_each(resolve);
        self.libraries.iter_mut().for_each(resolve);
        self.navigation_jsons.iter_mut().for_each(resolve);
        for path in [
            &mut self.output.merged,
            &mut self.output.blame,
            &mut self.output.aapt_safe,
            &mut self.output.report,
        ] {
            path.iter_mut().for_each(resolve);
        }
    }

    /// Build the merge invocation described by this configuration
    pub fn to_invoker(&self) -> Result<Invoker> {
        let main = self
            .main
            .clone()
            .ok_or_else(|| miette!("No main manifest configured"))?;

        let mut invoker = Invoker::new(InputSource::file(main), self.merge_type)
            .add_overlays(self.overlays.iter().cloned().map(InputSource::file))
            .add_libraries(self.libraries.iter().cloned().map(InputSource::file))
            .with_placeholders(self.placeholders.clone())
            .with_features(self.features.iter().copied())
            .with_dependency_feature_names(self.dependency_feature_names.iter().cloned());

        for navigation_json in &self.navigation_jsons {
            invoker = invoker.add_navigation_json(InputSource::file(navigation_json.clone()));
        }
        for (property, value) in self.overrides.entries() {
            invoker = invoker.with_override(property, value);
        }
        if let Some(namespace) = &self.namespace {
            invoker = invoker.with_namespace(namespace.clone());
        }
        if let Some(feature_name) = &self.feature_name {
            invoker = invoker.with_feature_name(feature_name.clone()).into_diagnostic()?;
        }
        if let Some(locale_config) = &self.locale_config {
            invoker = invoker.with_generated_locale_config(locale_config.clone());
        }
        Ok(invoker)
    }
}
