use super::{MergedManifestKind, MergingReport, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, report: &MergingReport) -> Result<()> {
        let json = self.render(report)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    /// Render the report without writing it anywhere
    pub fn render(&self, report: &MergingReport) -> Result<String> {
        serde_json::to_string_pretty(&JsonReport::from_report(report)).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    result: &'static str,
    package_name: Option<String>,
    records: Vec<JsonRecord>,
    actions: Vec<JsonNodeDecisions>,
    documents: JsonDocuments,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonRecord {
    severity: &'static str,
    message: String,
    position: Option<String>,
}

#[derive(Serialize)]
struct JsonNodeDecisions {
    key: String,
    node: Vec<JsonDecision>,
    attributes: Vec<JsonAttributeDecisions>,
}

#[derive(Serialize)]
struct JsonAttributeDecisions {
    name: String,
    decisions: Vec<JsonDecision>,
}

#[derive(Serialize)]
struct JsonDecision {
    action: &'static str,
    position: String,
    operation: Option<&'static str>,
}

#[derive(Serialize)]
struct JsonDocuments {
    merged: bool,
    blame: bool,
    aapt_safe: bool,
    aapt_safe_unchanged: bool,
    intermediary_stages: usize,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl JsonReport {
    fn from_report(report: &MergingReport) -> Self {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;

        let records = report
            .records()
            .iter()
            .map(|record| {
                match record.severity() {
                    Severity::Error => errors += 1,
                    Severity::Warning => warnings += 1,
                    Severity::Info => infos += 1,
                }
                JsonRecord {
                    severity: record.severity().as_str(),
                    message: record.message().to_string(),
                    position: record.position().map(ToString::to_string),
                }
            })
            .collect();

        let ledger = report.actions();
        let actions = ledger
            .node_keys()
            .into_iter()
            .map(|key| JsonNodeDecisions {
                key: key.to_string(),
                node: ledger
                    .node_records(key)
                    .iter()
                    .map(|r| JsonDecision {
                        action: r.action_type.as_str(),
                        position: r.position.to_string(),
                        operation: r.operation.map(|o| o.as_str()),
                    })
                    .collect(),
                attributes: ledger
                    .recorded_attributes(key)
                    .into_iter()
                    .map(|name| JsonAttributeDecisions {
                        name: name.to_string(),
                        decisions: ledger
                            .attribute_records(key, name)
                            .iter()
                            .map(|r| JsonDecision {
                                action: r.action_type.as_str(),
                                position: r.position.to_string(),
                                operation: r.operation.map(|o| o.tools_name()),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: "1.0",
            result: report.result().as_str(),
            package_name: report.package_name().map(str::to_string),
            records,
            actions,
            documents: JsonDocuments {
                merged: report.merged_document(MergedManifestKind::Merged).is_some(),
                blame: report.merged_document(MergedManifestKind::Blame).is_some(),
                aapt_safe: report.merged_document(MergedManifestKind::AaptSafe).is_some(),
                aapt_safe_unchanged: report.is_aapt_safe_manifest_unchanged(),
                intermediary_stages: report.intermediary_stages().len(),
            },
            summary: JsonSummary {
                errors,
                warnings,
                infos,
            },
        }
    }
}
