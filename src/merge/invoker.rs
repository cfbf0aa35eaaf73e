use super::aapt::aapt_safe_document;
use super::cleaner::{clean_tools, report_unused_directives};
use super::context::MergeContext;
use super::document::merge_documents;
use super::fqcn::ClassNameExtractor;
use super::loader::{load_document, InputSource};
use super::navigation::{expand_nav_graphs, load_navigation};
use super::system_property::{inject_system_properties, Injection, SystemProperty};
use super::{Feature, MergeType};
use crate::error::{InvalidFeatureName, MergeFailure};
use crate::model::ManifestModel;
use crate::placeholder::{resolve_document, APPLICATION_ID, PACKAGE_NAME};
use crate::report::{blame_document, ActionType, MergedManifestKind, MergingReport};
use crate::validation::{post, pre, validate_feature_name};
use crate::xml::{DocumentType, XmlDocument};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for building merge invocations
pub struct ManifestMerger;

impl ManifestMerger {
    /// Start an invocation that merges into the manifest at `main`
    pub fn new_merger(main: impl Into<PathBuf>, merge_type: MergeType) -> Invoker {
        Invoker::new(InputSource::file(main), merge_type)
    }
}

/// Builder for one merge invocation.
///
/// Collects the inputs, then [`Invoker::merge`] runs the whole pipeline and
/// returns a [`MergingReport`]. An invoker can be merged more than once;
/// every run starts from scratch.
#[derive(Debug, Clone)]
pub struct Invoker {
    model: Arc<ManifestModel>,
    main: InputSource,
    merge_type: MergeType,
    overlays: Vec<InputSource>,
    libraries: Vec<InputSource>,
    navigation_jsons: Vec<InputSource>,
    placeholders: BTreeMap<String, String>,
    overrides: BTreeMap<SystemProperty, String>,
    features: BTreeSet<Feature>,
    namespace: Option<String>,
    feature_name: Option<String>,
    dependency_feature_names: Vec<String>,
    locale_config: Option<String>,
}

impl Invoker {
    pub fn new(main: InputSource, merge_type: MergeType) -> Self {
        Self {
            model: Arc::new(ManifestModel::new()),
            main,
            merge_type,
            overlays: Vec::new(),
            libraries: Vec::new(),
            navigation_jsons: Vec::new(),
            placeholders: BTreeMap::new(),
            overrides: BTreeMap::new(),
            features: BTreeSet::new(),
            namespace: None,
            feature_name: None,
            dependency_feature_names: Vec::new(),
            locale_config: None,
        }
    }

    /// Use a custom policy table
    pub fn with_model(mut self, model: Arc<ManifestModel>) -> Self {
        self.model = model;
        self
    }

    /// Add an overlay; later overlays take priority over earlier ones
    pub fn add_overlay(mut self, overlay: InputSource) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn add_overlays(mut self, overlays: impl IntoIterator<Item = InputSource>) -> Self {
        self.overlays.extend(overlays);
        self
    }

    /// Add a library; earlier libraries take priority over later ones
    pub fn add_library(mut self, library: InputSource) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn add_libraries(mut self, libraries: impl IntoIterator<Item = InputSource>) -> Self {
        self.libraries.extend(libraries);
        self
    }

    pub fn add_navigation_json(mut self, navigation_json: InputSource) -> Self {
        self.navigation_jsons.push(navigation_json);
        self
    }

    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.placeholders.insert(key.into(), value.into());
        self
    }

    pub fn with_placeholders<K, V>(mut self, placeholders: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.placeholders
            .extend(placeholders.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_override(mut self, property: SystemProperty, value: impl Into<String>) -> Self {
        self.overrides.insert(property, value.into());
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }

    /// Namespace used to qualify class names and in place of a missing package
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Name of the dynamic feature being merged; rejected right away if malformed
    pub fn with_feature_name(mut self, name: impl Into<String>) -> Result<Self, InvalidFeatureName> {
        let name = name.into();
        validate_feature_name(&name)?;
        self.feature_name = Some(name);
        Ok(self)
    }

    pub fn with_dependency_feature_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependency_feature_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Resource reference written to `application@android:localeConfig`
    pub fn with_generated_locale_config(mut self, resource: impl Into<String>) -> Self {
        self.locale_config = Some(resource.into());
        self
    }

    /// Run the merge.
    ///
    /// Returns `Err` only for unreadable or malformed input and invalid
    /// invocations; everything else is reported through the records.
    pub fn merge(&self) -> Result<MergingReport, MergeFailure> {
        if self.merge_type == MergeType::Library && !self.libraries.is_empty() {
            return Err(MergeFailure::Invocation(
                "libraries cannot be merged into a library manifest".to_string(),
            ));
        }

        let model = self.model.as_ref();
        let mut ctx = MergeContext::new(model, self.merge_type, &self.features);
        ctx.known_features = self
            .feature_name
            .iter()
            .chain(&self.dependency_feature_names)
            .cloned()
            .collect();
        ctx.min_sdk_override = self.overrides.get(&SystemProperty::MinSdkVersion).cloned();

        info!(
            "Merging {} manifest with {} overlays and {} libraries",
            self.merge_type,
            self.overlays.len(),
            self.libraries.len()
        );

        let main = load_document(&self.main, DocumentType::Main, self.namespace.as_deref(), model)?;
        let main_package = self
            .namespace
            .clone()
            .or_else(|| main.package().map(str::to_string));
        let overlays = self
            .overlays
            .iter()
            .map(|source| load_document(source, DocumentType::Overlay, main_package.as_deref(), model))
            .collect::<Result<Vec<_>, _>>()?;
        let libraries = self
            .libraries
            .iter()
            .map(|source| load_document(source, DocumentType::Library, None, model))
            .collect::<Result<Vec<_>, _>>()?;
        let navigation = load_navigation(&self.navigation_jsons)?;

        let main = pre::validate_document(main, self.namespace.as_deref(), &mut ctx);
        let overlays: Vec<XmlDocument> = overlays
            .into_iter()
            .map(|doc| pre::validate_document(doc, None, &mut ctx))
            .collect();
        let libraries: Vec<XmlDocument> = libraries
            .into_iter()
            .map(|doc| pre::validate_document(doc, None, &mut ctx))
            .collect();
        pre::validate_selectors(std::iter::once(&main).chain(&overlays), &libraries, &mut ctx);
        if ctx.has(Feature::EnforceUniquePackageName) {
            pre::validate_unique_packages(main_package.as_deref(), &libraries, &mut ctx);
        }
        if ctx.should_stop() {
            return Ok(self.finish(ctx, None, Vec::new()));
        }

        ctx.record_subtree(main.root(), ActionType::Added);
        let mut stages = Vec::new();
        let mut merged = main;
        for doc in overlays.iter().chain(&libraries) {
            merged = merge_documents(&merged, doc, &mut ctx);
            if ctx.has(Feature::KeepIntermediaryStages) {
                stages.push(merged.to_xml());
            }
            if ctx.should_stop() {
                return Ok(self.finish(ctx, None, stages));
            }
        }

        let injection = Injection {
            overrides: &self.overrides,
            feature_name: self.feature_name.as_deref(),
            locale_config: self.locale_config.as_deref(),
        };
        merged = inject_system_properties(&merged, &injection, &mut ctx);

        let values = self.placeholder_values(&merged);
        let replace = !ctx.has(Feature::NoPlaceholderReplacement);
        merged = resolve_document(&merged, &values, replace, &mut ctx);

        if self.merge_type == MergeType::Application {
            merged = expand_nav_graphs(&merged, &navigation, &mut ctx);
        }

        post::validate_merged(&merged, self.namespace.as_deref(), &mut ctx);
        if ctx.should_stop() {
            return Ok(self.finish(ctx, None, stages));
        }

        if self.merge_type == MergeType::Application || ctx.has(Feature::RemoveToolsDeclarations) {
            report_unused_directives(&merged, &mut ctx);
            merged = clean_tools(&merged);
        }

        if ctx.has(Feature::ExtractFqcns) {
            if let Some(namespace) = main_package.as_deref() {
                let (root, _) = merged
                    .root()
                    .clone_and_transform(&mut ClassNameExtractor { namespace });
                merged = merged.with_root(root);
            }
        }

        Ok(self.finish(ctx, Some(merged), stages))
    }

    /// Placeholder values with the package-derived ones filled in
    fn placeholder_values(&self, merged: &XmlDocument) -> BTreeMap<String, String> {
        let mut values = self.placeholders.clone();
        let package = self
            .overrides
            .get(&SystemProperty::Package)
            .cloned()
            .or_else(|| merged.package().filter(|p| !p.contains("${")).map(str::to_string));
        match package {
            Some(package) => {
                values.insert(APPLICATION_ID.to_string(), package);
            }
            None => {
                values.remove(APPLICATION_ID);
            }
        }
        if let Some(package) = self.overrides.get(&SystemProperty::Package) {
            values.insert(PACKAGE_NAME.to_string(), package.clone());
        }
        values
    }

    fn finish(&self, ctx: MergeContext<'_>, merged: Option<XmlDocument>, stages: Vec<String>) -> MergingReport {
        let mut documents = HashMap::new();
        let mut aapt_safe_unchanged = true;
        let package_name = merged.as_ref().and_then(|d| d.package().map(str::to_string));

        if let Some(doc) = &merged {
            documents.insert(
                MergedManifestKind::Blame,
                blame_document(doc, &ctx.actions, ctx.model),
            );
            if !ctx.has_errors() {
                documents.insert(MergedManifestKind::Merged, doc.to_xml());
                if let Some(safe) = aapt_safe_document(doc, ctx.has(Feature::MakeAaptSafe)) {
                    documents.insert(MergedManifestKind::AaptSafe, safe.to_xml());
                    aapt_safe_unchanged = false;
                }
            }
        }

        debug!(
            "Merge finished with {} records, {} documents",
            ctx.records.len(),
            documents.len()
        );
        MergingReport::new(
            ctx.records,
            ctx.actions,
            documents,
            stages,
            aapt_safe_unchanged,
            package_name,
        )
    }
}
