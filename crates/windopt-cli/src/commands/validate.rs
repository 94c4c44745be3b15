use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::info;

use windopt_cli::common::{loader_for, resolve_library, write_json, OutputFormat};
use windopt_cli::config::WindoptSettings;
use windopt_core::{check_references, validate, StaticRegistry, ValidationIssue, ValidationReport};

#[derive(Serialize)]
struct ValidationOutput<'a> {
    config: String,
    clean: bool,
    summary: String,
    issues: &'a [ValidationIssue],
}

/// Returns whether the configuration is free of issues.
pub fn handle(
    config: &Path,
    registry: Option<&str>,
    format: OutputFormat,
    library: Option<&Path>,
    settings: &WindoptSettings,
) -> Result<bool> {
    let loader = loader_for(resolve_library(library, settings)?);
    let model = loader.load_path(config)?;

    let mut report = ValidationReport::from_issues(validate(&model));
    if let Some(registry) = registry {
        let registry = load_registry(registry)?;
        report.extend(check_references(&model, &registry));
    }
    info!(config = %config.display(), issues = report.len(), "validated configuration");

    match format {
        OutputFormat::Table => print_report(config, &report)?,
        OutputFormat::Json => {
            let output = ValidationOutput {
                config: config.display().to_string(),
                clean: report.is_clean(),
                summary: report.summary(),
                issues: &report.issues,
            };
            write_json(&output, &mut io::stdout(), true)?;
        }
    }
    Ok(report.is_clean())
}

fn load_registry(source: &str) -> Result<StaticRegistry> {
    if source == "builtin" {
        return Ok(StaticRegistry::builtin());
    }
    let text = fs::read_to_string(source)
        .with_context(|| format!("reading registry file '{source}'"))?;
    StaticRegistry::from_yaml_str(&text).with_context(|| format!("parsing registry file '{source}'"))
}

fn print_report(config: &Path, report: &ValidationReport) -> Result<()> {
    if report.is_clean() {
        println!("{}: configuration is valid", config.display());
        return Ok(());
    }
    println!("{}: {}", config.display(), report.summary());
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "KIND\tFIELD\tMESSAGE")?;
    for issue in &report.issues {
        writeln!(writer, "{}\t{}\t{}", issue.kind, issue.field, issue.message)?;
    }
    writer.flush()?;
    Ok(())
}
