use super::{Feature, MergeType};
use crate::model::{ManifestModel, NodeKey};
use crate::report::{ActionType, Actions, Record, Severity};
use crate::xml::{SourceFilePosition, XmlElement};
use std::collections::BTreeSet;

/// Mutable state threaded through one merge invocation
pub(crate) struct MergeContext<'a> {
    pub(crate) model: &'a ManifestModel,
    pub(crate) merge_type: MergeType,
    features: &'a BTreeSet<Feature>,
    /// Feature name of the module plus the names of its feature dependencies
    pub(crate) known_features: Vec<String>,
    pub(crate) min_sdk_override: Option<String>,
    pub(crate) records: Vec<Record>,
    pub(crate) actions: Actions,
}

impl<'a> MergeContext<'a> {
    pub(crate) fn new(model: &'a ManifestModel, merge_type: MergeType, features: &'a BTreeSet<Feature>) -> Self {
        Self {
            model,
            merge_type,
            features,
            known_features: Vec::new(),
            min_sdk_override: None,
            records: Vec::new(),
            actions: Actions::new(),
        }
    }

    pub(crate) fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub(crate) fn error(&mut self, position: SourceFilePosition, message: impl Into<String>) {
        self.add(Severity::Error, position, message);
    }

    pub(crate) fn warning(&mut self, position: SourceFilePosition, message: impl Into<String>) {
        self.add(Severity::Warning, position, message);
    }

    pub(crate) fn info(&mut self, position: SourceFilePosition, message: impl Into<String>) {
        self.add(Severity::Info, position, message);
    }

    pub(crate) fn add(&mut self, severity: Severity, position: SourceFilePosition, message: impl Into<String>) {
        self.records.push(Record::new(severity, message, Some(position)));
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity() == Severity::Error)
    }

    /// Whether the pipeline must stop after the current stage
    pub(crate) fn should_stop(&self) -> bool {
        self.has_errors() && !self.has(Feature::KeepGoingAfterErrors)
    }

    /// Record `action` for `element` and everything below it
    pub(crate) fn record_subtree(&mut self, element: &XmlElement, action: ActionType) {
        let key = self.model.key(element);
        self.record_element(&key, element, action);
        for child in element.child_elements() {
            self.record_subtree(child, action);
        }
    }

    fn record_element(&mut self, key: &NodeKey, element: &XmlElement, action: ActionType) {
        self.actions.record_node(key, action, element.position(), None);
        for attribute in element.attributes() {
            if attribute.name().is_tools() {
                continue;
            }
            self.actions
                .record_attribute(key, attribute.name(), action, attribute.position(), None);
        }
    }
}
