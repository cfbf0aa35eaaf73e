use super::{MergeResult, MergingReport, Record, Severity};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Print info records too
    show_info: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_info: true }
    }

    pub fn with_info(mut self, show: bool) -> Self {
        self.show_info = show;
        self
    }

    pub fn report(&self, report: &MergingReport) -> Result<()> {
        let shown: Vec<&Record> = report
            .records()
            .iter()
            .filter(|r| self.show_info || r.severity() != Severity::Info)
            .collect();

        if shown.is_empty() {
            println!("{}", "Manifest merged without issues".green().bold());
            self.print_summary(report);
            return Ok(());
        }

        // Group by file; records without a position go last
        let mut by_file: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
        let mut unplaced = Vec::new();
        for record in shown {
            match record.position() {
                Some(position) => by_file.entry(position.file.to_string()).or_default().push(record),
                None => unplaced.push(record),
            }
        }

        println!();
        for (file, records) in &by_file {
            println!("{}", file.cyan().bold());
            for record in records {
                self.print_record(record);
            }
            println!();
        }
        for record in unplaced {
            self.print_record(record);
        }

        self.print_summary(report);
        Ok(())
    }

    fn print_record(&self, record: &Record) {
        let severity = match record.severity() {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        let location = record
            .position()
            .and_then(|p| p.span)
            .map(|span| span.to_string())
            .unwrap_or_default();

        let mut lines = record.message().lines();
        println!(
            "  {} {} {}",
            location.dimmed(),
            severity,
            lines.next().unwrap_or_default()
        );
        for line in lines {
            println!("    {}", line.trim_start().dimmed());
        }
    }

    fn print_summary(&self, report: &MergingReport) {
        let count = |severity| report.records_with_severity(severity).count();
        let (errors, warnings, infos) = (count(Severity::Error), count(Severity::Warning), count(Severity::Info));

        println!("{}", "─".repeat(60).dimmed());

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} errors", errors).red().to_string());
        }
        if warnings > 0 {
            parts.push(format!("{} warnings", warnings).yellow().to_string());
        }
        if infos > 0 {
            parts.push(format!("{} info", infos).blue().to_string());
        }
        let result = match report.result() {
            MergeResult::Success => "SUCCESS".green().bold(),
            MergeResult::Warning => "WARNING".yellow().bold(),
            MergeResult::Error => "ERROR".red().bold(),
        };
        if parts.is_empty() {
            println!("Merge result: {}", result);
        } else {
            println!("Merge result: {} ({})", result, parts.join(", "));
        }
        if let Some(package) = report.package_name() {
            println!("{} {}", "Package:".dimmed(), package);
        }

        if report.result().is_error() {
            println!();
            println!(
                "{}",
                "Tip: add tools:replace or tools:node directives to resolve conflicts".dimmed()
            );
            println!(
                "{}",
                "Tip: run with --feature keep_going_after_errors to see every problem".dimmed()
            );
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
