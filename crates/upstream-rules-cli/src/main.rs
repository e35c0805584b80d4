//! Command-line checks for upstream request rewrite rules.
//!
//! Validates persisted rule sets, rewrites them in canonical form and
//! compares an editable draft against its persisted baseline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use upstream_rules::{
    load_draft, load_rule_set, EditableRuleSet, FieldIssue, LoadError, ReservedNames, RuleKind,
};
use upstream_rules_telemetry::{
    log_draft_compared, log_load_failed, log_rules_loaded, log_rules_normalized,
    log_validation_failure, LogFormat, TelemetryConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "upstream-rules",
    about = "Check and normalize upstream request rewrite rules",
    version
)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn", env = "UPSTREAM_RULES_LOG_LEVEL")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, default_value = "pretty", value_parser = ["pretty", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate persisted rule set file(s).
    ///
    /// Exits 1 if any file cannot be read or holds an invalid rule.
    Validate {
        /// Rule set file(s) (JSON, or YAML by extension).
        #[arg(short, long, required = true, num_args = 1..)]
        rules: Vec<PathBuf>,

        /// Output format.
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// File overriding the reserved header and body field names.
        #[arg(long)]
        reserved: Option<PathBuf>,
    },

    /// Rewrite a rule set in canonical form.
    Normalize {
        /// Rule set file (JSON, or YAML by extension).
        #[arg(short, long)]
        rules: PathBuf,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File overriding the reserved header and body field names.
        #[arg(long)]
        reserved: Option<PathBuf>,
    },

    /// Compare an editable draft with its persisted baseline.
    ///
    /// Prints `changed` or `unchanged`. Exits 1 if the draft is not save-eligible.
    Diff {
        /// Persisted rule set file.
        #[arg(long)]
        baseline: PathBuf,

        /// Editable draft file.
        #[arg(long)]
        draft: PathBuf,

        /// Output format.
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// File overriding the reserved header and body field names.
        #[arg(long)]
        reserved: Option<PathBuf>,
    },
}

/// Validation result for a single rule set file.
#[derive(Serialize)]
struct ValidationResult {
    file: String,
    valid: bool,
    errors: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidationIssue {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl From<&FieldIssue> for ValidationIssue {
    fn from(issue: &FieldIssue) -> Self {
        let list = match issue.kind {
            RuleKind::Header => "header_rules",
            RuleKind::Body => "body_rules",
        };
        ValidationIssue {
            code: issue.error.code().to_string(),
            message: issue.error.to_string(),
            location: Some(format!("{}[{}].{}", list, issue.index, issue.field.as_str())),
        }
    }
}

fn load_error_issue(err: &LoadError) -> ValidationIssue {
    ValidationIssue {
        code: "E2000".to_string(),
        message: err.to_string(),
        location: None,
    }
}

fn load_reserved(path: Option<&Path>) -> Result<ReservedNames, ExitCode> {
    match path {
        None => Ok(ReservedNames::default()),
        Some(path) => ReservedNames::from_file(path).map_err(|e| {
            log_load_failed!(file = %path.display(), error = %e, "failed to load reserved names");
            eprintln!("error: failed to load reserved names from {}: {}", path.display(), e);
            ExitCode::from(1)
        }),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            Ok(())
        }
        Err(e) => {
            eprintln!("error: failed to serialize output: {}", e);
            Err(ExitCode::from(1))
        }
    }
}

/// Run the validate command.
fn run_validate(files: &[PathBuf], output_format: &str, reserved: Option<&Path>) -> ExitCode {
    let reserved = match load_reserved(reserved) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let mut results = Vec::new();

    for path in files {
        let file = path.display().to_string();
        let errors = match load_rule_set(path) {
            Ok(rules) => {
                log_rules_loaded!(
                    file = %file,
                    header_rules = rules.header_rules.len(),
                    body_rules = rules.body_rules.len()
                );
                let report = EditableRuleSet::from_canonical(&rules).validate(&reserved);
                if !report.is_save_eligible() {
                    log_validation_failure!(file = %file, issues = report.len());
                }
                report.issues().iter().map(ValidationIssue::from).collect()
            }
            Err(e) => {
                log_load_failed!(file = %file, error = %e);
                vec![load_error_issue(&e)]
            }
        };

        results.push(ValidationResult {
            file,
            valid: errors.is_empty(),
            errors,
        });
    }

    let has_errors = results.iter().any(|r| !r.valid);

    if output_format == "json" {
        let output = serde_json::json!({
            "results": results,
            "summary": {
                "total": results.len(),
                "valid": results.iter().filter(|r| r.valid).count(),
                "invalid": results.iter().filter(|r| !r.valid).count(),
            }
        });
        if let Err(code) = print_json(&output) {
            return code;
        }
    } else {
        for result in &results {
            if result.valid {
                eprintln!("✓ {} is valid", result.file);
            } else {
                eprintln!("✗ {} has {} error(s)", result.file, result.errors.len());
            }
            for err in &result.errors {
                if let Some(loc) = &err.location {
                    eprintln!("  {} [{}]: {}", err.code, loc, err.message);
                } else {
                    eprintln!("  {}: {}", err.code, err.message);
                }
            }
        }

        let valid_count = results.iter().filter(|r| r.valid).count();
        let total = results.len();
        eprintln!();
        eprintln!(
            "validated {} rule set(s): {} valid, {} invalid",
            total,
            valid_count,
            total - valid_count
        );
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Run the normalize command.
fn run_normalize(rules_path: &Path, output: Option<&Path>, reserved: Option<&Path>) -> ExitCode {
    let reserved = match load_reserved(reserved) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let rules = match load_rule_set(rules_path) {
        Ok(r) => r,
        Err(e) => {
            log_load_failed!(file = %rules_path.display(), error = %e);
            eprintln!("error: {}: {}", rules_path.display(), e);
            return ExitCode::from(1);
        }
    };

    let draft = EditableRuleSet::from_canonical(&rules);
    let report = draft.validate(&reserved);
    if !report.is_save_eligible() {
        log_validation_failure!(file = %rules_path.display(), issues = report.len());
        eprintln!("✗ {} has {} error(s)", rules_path.display(), report.len());
        for issue in report.issues() {
            let issue = ValidationIssue::from(issue);
            eprintln!(
                "  {} [{}]: {}",
                issue.code,
                issue.location.unwrap_or_default(),
                issue.message
            );
        }
        return ExitCode::from(1);
    }

    let canonical = draft.canonicalize();
    let text = match serde_json::to_string_pretty(&canonical) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to serialize rule set: {}", e);
            return ExitCode::from(1);
        }
    };

    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, format!("{}\n", text)) {
                eprintln!("error: failed to write {}: {}", out.display(), e);
                return ExitCode::from(1);
            }
            eprintln!("wrote {}", out.display());
        }
        None => println!("{}", text),
    }

    log_rules_normalized!(
        file = %rules_path.display(),
        header_rules = canonical.header_rules.len(),
        body_rules = canonical.body_rules.len()
    );
    ExitCode::SUCCESS
}

/// Run the diff command.
fn run_diff(
    baseline_path: &Path,
    draft_path: &Path,
    output_format: &str,
    reserved: Option<&Path>,
) -> ExitCode {
    let reserved = match load_reserved(reserved) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let baseline = match load_rule_set(baseline_path) {
        Ok(r) => r,
        Err(e) => {
            log_load_failed!(file = %baseline_path.display(), error = %e);
            eprintln!("error: {}: {}", baseline_path.display(), e);
            return ExitCode::from(1);
        }
    };

    let draft: EditableRuleSet = match load_draft(draft_path) {
        Ok(d) => d,
        Err(e) => {
            log_load_failed!(file = %draft_path.display(), error = %e);
            eprintln!("error: {}: {}", draft_path.display(), e);
            return ExitCode::from(1);
        }
    };

    let changed = draft.has_changes(&baseline);
    let report = draft.validate(&reserved);
    let issues: Vec<ValidationIssue> = report.issues().iter().map(ValidationIssue::from).collect();
    log_draft_compared!(changed, save_eligible = report.is_save_eligible());

    if output_format == "json" {
        let output = serde_json::json!({
            "changed": changed,
            "save_eligible": report.is_save_eligible(),
            "issues": issues,
            "canonical": draft.canonicalize(),
        });
        if let Err(code) = print_json(&output) {
            return code;
        }
    } else {
        println!("{}", if changed { "changed" } else { "unchanged" });
        for issue in &issues {
            eprintln!(
                "  {} [{}]: {}",
                issue.code,
                issue.location.as_deref().unwrap_or_default(),
                issue.message
            );
        }
    }

    if report.is_save_eligible() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(LogFormat::parse(&cli.log_format).unwrap_or_default());
    if let Err(e) = upstream_rules_telemetry::init(&telemetry) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Commands::Validate {
            rules,
            format,
            reserved,
        } => run_validate(&rules, &format, reserved.as_deref()),
        Commands::Normalize {
            rules,
            output,
            reserved,
        } => run_normalize(&rules, output.as_deref(), reserved.as_deref()),
        Commands::Diff {
            baseline,
            draft,
            format,
            reserved,
        } => run_diff(&baseline, &draft, &format, reserved.as_deref()),
    }
}
