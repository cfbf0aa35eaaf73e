//! Merge outcome: logging records, the provenance ledger and result documents

mod actions;
mod blame;
mod json;
mod terminal;

pub use actions::{ActionType, Actions, AttributeRecord, DecisionTreeRecord, NodeRecord};
pub use json::JsonReporter;
pub use terminal::TerminalReporter;

pub(crate) use blame::blame_document;

use crate::xml::SourceFilePosition;
use miette::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Severity of a logging record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message produced while merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    severity: Severity,
    message: String,
    position: Option<SourceFilePosition>,
}

impl Record {
    pub fn new(severity: Severity, message: impl Into<String>, position: Option<SourceFilePosition>) -> Self {
        Self {
            severity,
            message: message.into(),
            position,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Option<&SourceFilePosition> {
        self.position.as_ref()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} {}:\n\t{}", position, self.severity, self.message),
            None => write!(f, "{}:\n\t{}", self.severity, self.message),
        }
    }
}

/// Overall outcome of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    Success,
    Warning,
    Error,
}

impl MergeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeResult::Success => "SUCCESS",
            MergeResult::Warning => "WARNING",
            MergeResult::Error => "ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    pub fn is_error(&self) -> bool {
        *self == MergeResult::Error
    }

    /// Derive the outcome from records; info records never count
    pub fn from_records(records: &[Record]) -> Self {
        match records.iter().map(Record::severity).max() {
            Some(Severity::Error) => MergeResult::Error,
            Some(Severity::Warning) => MergeResult::Warning,
            _ => MergeResult::Success,
        }
    }
}

impl fmt::Display for MergeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kinds of documents a merge can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergedManifestKind {
    /// The merged manifest, ready for packaging
    Merged,
    /// The merged manifest annotated with provenance comments
    Blame,
    /// The merged manifest without elements the resource compiler rejects
    AaptSafe,
}

/// Everything a merge invocation produced. Read-only once returned.
#[derive(Debug, Clone)]
pub struct MergingReport {
    result: MergeResult,
    records: Vec<Record>,
    actions: Actions,
    documents: HashMap<MergedManifestKind, String>,
    intermediary_stages: Vec<String>,
    aapt_safe_unchanged: bool,
    package_name: Option<String>,
}

impl MergingReport {
    pub(crate) fn new(
        records: Vec<Record>,
        actions: Actions,
        documents: HashMap<MergedManifestKind, String>,
        intermediary_stages: Vec<String>,
        aapt_safe_unchanged: bool,
        package_name: Option<String>,
    ) -> Self {
        Self {
            result: MergeResult::from_records(&records),
            records,
            actions,
            documents,
            intermediary_stages,
            aapt_safe_unchanged,
            package_name,
        }
    }

    pub fn result(&self) -> MergeResult {
        self.result
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.severity == severity)
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Serialized document of `kind`, if it was produced
    pub fn merged_document(&self, kind: MergedManifestKind) -> Option<&str> {
        self.documents.get(&kind).map(String::as_str)
    }

    /// Serialized document after each overlay and library step
    pub fn intermediary_stages(&self) -> &[String] {
        &self.intermediary_stages
    }

    /// True when the AAPT-safe variant would equal the merged document
    pub fn is_aapt_safe_manifest_unchanged(&self) -> bool {
        self.aapt_safe_unchanged
    }

    /// Package of the merged manifest
    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }
}

/// Output format for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Renders a [`MergingReport`] for humans or tools
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn report(&self, report: &MergingReport) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(report),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(report),
        }
    }
}
