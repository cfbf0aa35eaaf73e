use clap::Parser;
use colored::Colorize;
use manifest_merger::{
    Config, Feature, MergeType, MergedManifestKind, MergingReport, ReportFormat, Reporter, Severity,
    SystemProperty,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// manifest-merger - Merge Android manifests from an app, its overlays and its libraries
#[derive(Parser, Debug)]
#[command(name = "manifest-merger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Main AndroidManifest.xml (may also come from the config file)
    main: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kind of artifact being produced: application or library
    #[arg(short, long)]
    merge_type: Option<MergeType>,

    /// Overlay manifest, lowest priority first (can be specified multiple times)
    #[arg(long)]
    overlay: Vec<PathBuf>,

    /// Library manifest, highest priority first (can be specified multiple times)
    #[arg(short, long)]
    library: Vec<PathBuf>,

    /// Navigation JSON used to expand <nav-graph> (can be specified multiple times)
    #[arg(long, value_name = "FILE")]
    nav_json: Vec<PathBuf>,

    /// Placeholder value as key=value (can be specified multiple times)
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    placeholder: Vec<(String, String)>,

    /// System property override as name=value, e.g. min_sdk_version=21
    #[arg(long = "override", value_name = "NAME=VALUE", value_parser = parse_override)]
    overrides: Vec<(SystemProperty, String)>,

    /// Merge feature to enable, e.g. extract_fqcns (can be specified multiple times)
    #[arg(short, long)]
    feature: Vec<Feature>,

    /// Namespace used for class names when the main manifest has no package
    #[arg(long)]
    namespace: Option<String>,

    /// Name of the dynamic feature being merged
    #[arg(long)]
    feature_name: Option<String>,

    /// Feature name this module depends on (can be specified multiple times)
    #[arg(long)]
    dependency_feature: Vec<String>,

    /// Generated locale config resource for application@android:localeConfig
    #[arg(long)]
    locale_config: Option<String>,

    /// Write the merged manifest here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the blame manifest here
    #[arg(long)]
    blame_out: Option<PathBuf>,

    /// Write the AAPT-safe manifest here
    #[arg(long)]
    aapt_safe_out: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the json report
    #[arg(long)]
    report_out: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn parse_key_value(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}

fn parse_override(value: &str) -> std::result::Result<(SystemProperty, String), String> {
    let (name, value) = parse_key_value(value)?;
    Ok((name.parse()?, value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("manifest-merger v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    run_merge(&config)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Look next to the main manifest, then in the working directory
        let root = cli
            .main
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Config::from_default_locations(root)?
    };

    // Override with CLI arguments
    if let Some(main) = &cli.main {
        config.main = Some(main.clone());
    }
    if let Some(merge_type) = cli.merge_type {
        config.merge_type = merge_type;
    }
    config.overlays.extend(cli.overlay.iter().cloned());
    config.libraries.extend(cli.library.iter().cloned());
    config.navigation_jsons.extend(cli.nav_json.iter().cloned());
    config.placeholders.extend(cli.placeholder.iter().cloned());
    for (property, value) in &cli.overrides {
        config.overrides.set(*property, value.clone());
    }
    for feature in &cli.feature {
        if !config.features.contains(feature) {
            config.features.push(*feature);
        }
    }
    if let Some(namespace) = &cli.namespace {
        config.namespace = Some(namespace.clone());
    }
    if let Some(feature_name) = &cli.feature_name {
        config.feature_name = Some(feature_name.clone());
    }
    config
        .dependency_feature_names
        .extend(cli.dependency_feature.iter().cloned());
    if let Some(locale_config) = &cli.locale_config {
        config.locale_config = Some(locale_config.clone());
    }
    if let Some(out) = &cli.out {
        config.output.merged = Some(out.clone());
    }
    if let Some(blame) = &cli.blame_out {
        config.output.blame = Some(blame.clone());
    }
    if let Some(aapt_safe) = &cli.aapt_safe_out {
        config.output.aapt_safe = Some(aapt_safe.clone());
    }
    if let Some(report) = &cli.report_out {
        config.output.report = Some(report.clone());
    }
    if let Some(format) = &cli.format {
        config.output.format = match format {
            OutputFormat::Terminal => "terminal",
            OutputFormat::Json => "json",
        }
        .to_string();
    }

    Ok(config)
}

fn run_merge(config: &Config) -> Result<()> {
    use std::time::Instant;

    let start_time = Instant::now();

    let invoker = config.to_invoker()?;
    let report = invoker.merge().into_diagnostic()?;
    debug!("Merged in {:?}", start_time.elapsed());

    write_documents(config, &report)?;

    let format = match config.output.format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Terminal,
    };
    let reporter = Reporter::new(format.into(), config.output.report.clone());
    reporter.report(&report)?;

    if report.result().is_error() {
        let errors = report.records_with_severity(Severity::Error).count();
        return Err(miette::miette!(
            "Manifest merger failed with {} error{}",
            errors,
            if errors == 1 { "" } else { "s" }
        ));
    }

    info!("Merge finished in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn write_documents(config: &Config, report: &MergingReport) -> Result<()> {
    if let Some(merged) = report.merged_document(MergedManifestKind::Merged) {
        match &config.output.merged {
            Some(path) => write_file(path, merged)?,
            None => print!("{}", merged),
        }
    }
    if let (Some(path), Some(blame)) = (
        &config.output.blame,
        report.merged_document(MergedManifestKind::Blame),
    ) {
        write_file(path, blame)?;
    }
    if let Some(path) = &config.output.aapt_safe {
        // Without a distinct variant the merged manifest is already safe
        let document = report
            .merged_document(MergedManifestKind::AaptSafe)
            .or_else(|| report.merged_document(MergedManifestKind::Merged));
        if let Some(document) = document {
            write_file(path, document)?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    eprintln!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
