//! Offline commands: `validate` and `check-ruleset`.
//!
//! `validate` runs files through the same pipeline as the HTTP endpoints and
//! reports per-file results. Exit codes: 1 when a file fails the gate, 2 when
//! the ruleset cannot be loaded, 3 when a file cannot be read.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::ValueEnum;
use oasgate_core::{Finding, RuleEngine, Upload, ValidationResult, Validator};
use oasgate_ruleset::{RulesetEngine, RulesetError};
use oasgate_telemetry::log_ruleset_loaded;
use serde::Serialize;

/// Output format of `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Result for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    /// Findings that fail the gate.
    errors: usize,
    warnings: usize,
    findings: Vec<Finding>,
    /// Set when the file never produced findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl FileReport {
    fn from_result(file: String, result: ValidationResult) -> Self {
        let errors = result.findings().iter().filter(|f| f.fails_gate()).count();
        let valid = !result.has_errors();
        let findings = result.into_findings();
        Self {
            file,
            valid,
            errors,
            warnings: findings.len() - errors,
            findings,
            failure: None,
        }
    }

    fn failed(file: String, failure: String) -> Self {
        Self {
            file,
            valid: false,
            errors: 1,
            warnings: 0,
            findings: Vec::new(),
            failure: Some(failure),
        }
    }
}

/// Load the ruleset and build the engine, logging what was loaded.
pub fn load_engine(ruleset: &Path) -> Result<RulesetEngine, RulesetError> {
    let engine = RulesetEngine::load(ruleset)?;
    log_ruleset_loaded!(
        ruleset = %ruleset.display(),
        rules = engine.ruleset().rules().len(),
        active = engine.rule_count()
    );
    Ok(engine)
}

/// `oasgate validate`
pub fn run_validate(specs: &[PathBuf], ruleset: &Path, format: OutputFormat) -> ExitCode {
    let engine = match load_engine(ruleset) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };
    let validator = Validator::new(Arc::new(engine));

    let mut reports = Vec::with_capacity(specs.len());
    let mut unreadable = false;

    for spec in specs {
        let file = spec.display().to_string();
        let bytes = match std::fs::read(spec) {
            Ok(bytes) => bytes,
            Err(e) => {
                unreadable = true;
                reports.push(FileReport::failed(file, format!("cannot read file: {}", e)));
                continue;
            }
        };

        let name = spec
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        match validator.validate(&Upload::new(name, None, bytes)) {
            Ok((_, result)) => reports.push(FileReport::from_result(file, result)),
            Err(e) => reports.push(FileReport::failed(file, e.to_string())),
        }
    }

    match format {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Text => print_text(&reports),
    }

    if unreadable {
        ExitCode::from(3)
    } else if reports.iter().any(|r| !r.valid) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(reports: &[FileReport]) {
    let valid = reports.iter().filter(|r| r.valid).count();
    let output = serde_json::json!({
        "results": reports,
        "summary": {
            "total": reports.len(),
            "valid": valid,
            "invalid": reports.len() - valid,
        }
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("error: cannot render report: {}", e),
    }
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        if let Some(failure) = &report.failure {
            eprintln!("✗ {}: {}", report.file, failure);
            continue;
        }

        if report.valid && report.findings.is_empty() {
            eprintln!("✓ {} is valid", report.file);
        } else if report.valid {
            eprintln!(
                "✓ {} is valid (with {} warning(s))",
                report.file, report.warnings
            );
        } else {
            eprintln!("✗ {} has {} error(s)", report.file, report.errors);
        }

        for finding in &report.findings {
            eprintln!("  {}", finding_line(finding));
        }
    }

    let valid = reports.iter().filter(|r| r.valid).count();
    eprintln!();
    eprintln!(
        "validated {} spec(s): {} valid, {} invalid",
        reports.len(),
        valid,
        reports.len() - valid
    );
}

/// `line:col  severity  code  message  path`, positions one-based.
fn finding_line(finding: &Finding) -> String {
    let start = finding.range().start;
    let mut line = format!(
        "{}:{}  {:<11}  {}  {}",
        start.line + 1,
        start.character + 1,
        finding.severity().label().to_ascii_lowercase(),
        finding.code(),
        finding.message()
    );
    if !finding.path().is_empty() {
        line.push_str("  ");
        line.push_str(&finding.path_display());
    }
    line
}

/// `oasgate check-ruleset`
pub fn run_check_ruleset(ruleset: &Path) -> ExitCode {
    let engine = match load_engine(ruleset) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("✗ {}", e);
            return ExitCode::from(2);
        }
    };

    let rules = engine.ruleset().rules();
    let active = engine.ruleset().active_rules().count();
    println!(
        "✓ {}: {} rule(s), {} active",
        ruleset.display(),
        rules.len(),
        active
    );
    for rule in rules {
        let formats = if rule.is_format_agnostic() {
            "any".to_string()
        } else {
            rule.formats
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("  {:<40} {:<5} [{}]", rule.name, rule.severity.as_str(), formats);
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasgate_core::{Position, Range, RawDiagnostic, UNRECOGNIZED_FORMAT};

    fn result(diagnostics: Vec<RawDiagnostic>) -> ValidationResult {
        ValidationResult::from_diagnostics(&diagnostics).unwrap()
    }

    #[test]
    fn gate_failures_are_counted_as_errors() {
        let report = FileReport::from_result(
            "api.yaml".into(),
            result(vec![
                RawDiagnostic::new(UNRECOGNIZED_FORMAT, "unknown", 1),
                RawDiagnostic::new("info-contact", "no contact", 1),
            ]),
        );
        assert!(!report.valid);
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn warnings_only_is_valid() {
        let report = FileReport::from_result(
            "api.yaml".into(),
            result(vec![RawDiagnostic::new("operation-tags", "no tags", 2)]),
        );
        assert!(report.valid);
        assert_eq!(report.errors, 0);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn finding_line_is_one_based() {
        let findings = result(vec![RawDiagnostic::new("info-contact", "no contact", 1)
            .with_path(vec!["info".into(), "contact".into()])
            .with_range(Range::new(Position::new(1, 0), Position::new(1, 5)))])
        .into_findings();
        assert_eq!(
            finding_line(&findings[0]),
            "2:1  warning      info-contact  no contact  info.contact"
        );
    }

    #[test]
    fn failed_file_report_serializes_failure() {
        let report = FileReport::failed("missing.yaml".into(), "cannot read file".into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["failure"], "cannot read file");
        assert_eq!(json["findings"], serde_json::json!([]));
    }
}
