//! CLI regression tests for the `upstream-rules` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and output formats.
//!
//! Run with: `cargo test -p upstream-rules-test`
//! Requires the binary to be built first (`cargo build -p upstream-rules-cli`).

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;

use upstream_rules::{BodyRule, EditableRuleSet, RuleSet};

use crate::fixtures::{fixture, write_draft, write_rule_set};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `upstream-rules` binary.
fn upstream_rules() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("upstream-rules")
        .expect("upstream-rules binary not found; run `cargo build -p upstream-rules-cli` first")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let s = String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("output should be valid JSON")
}

// ---------------------------------------------------------------------------
// upstream-rules validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_rules_exits_zero() {
    upstream_rules()
        .args(["validate", "--rules"])
        .arg(fixture("valid.json"))
        .assert()
        .success()
        .stderr(contains("is valid"));
}

#[test]
fn validate_yaml_rules_exits_zero() {
    upstream_rules()
        .args(["validate", "--rules"])
        .arg(fixture("valid.yaml"))
        .assert()
        .success();
}

#[test]
fn validate_reserved_names_exits_one() {
    upstream_rules()
        .args(["validate", "--rules"])
        .arg(fixture("invalid-reserved.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2003"))
        .stderr(contains("E2004"));
}

#[test]
fn validate_conflict_reports_both_rules() {
    upstream_rules()
        .args(["validate", "--rules"])
        .arg(fixture("invalid-conflict.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("header_rules[0].key"))
        .stderr(contains("header_rules[1].key"));
}

#[test]
fn validate_missing_file_exits_one() {
    upstream_rules()
        .args(["validate", "--rules", "this-file-does-not-exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2000"));
}

#[test]
fn validate_missing_rules_flag_exits_two() {
    upstream_rules().arg("validate").assert().failure().code(2);
}

#[test]
fn validate_json_format_separates_regex_errors() {
    let output = upstream_rules()
        .args(["validate", "--format", "json", "--rules"])
        .arg(fixture("invalid-regex.json"))
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["summary"]["invalid"], 1);
    let errors = v["results"][0]["errors"]
        .as_array()
        .expect("errors should be an array");
    let locations: Vec<&str> = errors
        .iter()
        .filter_map(|e| e["location"].as_str())
        .collect();
    assert_eq!(locations, vec!["body_rules[0].flags", "body_rules[1].pattern"]);
    assert_eq!(errors[0]["code"], "E2009");
    assert_eq!(errors[1]["code"], "E2008");
}

#[test]
fn validate_multiple_files_summary() {
    let output = upstream_rules()
        .args(["validate", "--format", "json", "--rules"])
        .arg(fixture("valid.json"))
        .arg(fixture("invalid-conflict.json"))
        .assert()
        .failure()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["summary"]["total"], 2);
    assert_eq!(v["summary"]["valid"], 1);
    assert_eq!(v["results"][0]["valid"], true);
    assert_eq!(v["results"][1]["valid"], false);
}

#[test]
fn validate_with_reserved_override() {
    // Override clears reserved headers and reserves `user` instead
    upstream_rules()
        .args(["validate", "--reserved"])
        .arg(fixture("reserved-override.yaml"))
        .arg("--rules")
        .arg(fixture("invalid-reserved.json"))
        .assert()
        .success();

    upstream_rules()
        .args(["validate", "--reserved"])
        .arg(fixture("reserved-override.yaml"))
        .arg("--rules")
        .arg(fixture("valid.json"))
        .assert()
        .failure()
        .stderr(contains("body_rules[1].path"));
}

#[test]
fn validate_bad_reserved_file_exits_one() {
    upstream_rules()
        .args(["validate", "--reserved", "missing-reserved.yaml", "--rules"])
        .arg(fixture("valid.json"))
        .assert()
        .failure()
        .code(1);
}

// ---------------------------------------------------------------------------
// upstream-rules normalize
// ---------------------------------------------------------------------------

#[test]
fn normalize_round_trips_canonical_rules() {
    let output = upstream_rules()
        .args(["normalize", "--rules"])
        .arg(fixture("valid.json"))
        .assert()
        .success()
        .get_output()
        .clone();

    let normalized: RuleSet =
        serde_json::from_value(stdout_json(&output)).expect("output should be a rule set");
    let original: RuleSet = serde_json::from_str(
        &std::fs::read_to_string(fixture("valid.json")).expect("read fixture"),
    )
    .expect("fixture should parse");
    assert_eq!(normalized, original);
}

#[test]
fn normalize_keeps_append_as_append() {
    let output = upstream_rules()
        .args(["normalize", "--rules"])
        .arg(fixture("valid.yaml"))
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(
        v["body_rules"][0],
        json!({"action": "append", "path": "messages", "value": 1})
    );
}

#[test]
fn normalize_writes_output_file() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("out.json");

    upstream_rules()
        .args(["normalize", "--rules"])
        .arg(fixture("valid.yaml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).expect("output file");
    let rules: RuleSet = serde_json::from_str(&written).expect("valid rule set");
    assert_eq!(rules.header_rules.len(), 1);
    assert_eq!(rules.body_rules.len(), 2);
}

#[test]
fn normalize_invalid_rules_exits_one() {
    upstream_rules()
        .args(["normalize", "--rules"])
        .arg(fixture("invalid-reserved.json"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicates::str::is_empty());
}

// ---------------------------------------------------------------------------
// upstream-rules diff
// ---------------------------------------------------------------------------

#[test]
fn diff_untouched_append_is_unchanged() {
    upstream_rules()
        .args(["diff", "--baseline"])
        .arg(fixture("baseline.json"))
        .arg("--draft")
        .arg(fixture("draft-unchanged.json"))
        .assert()
        .success()
        .stdout(contains("unchanged"));
}

#[test]
fn diff_index_edit_is_changed() {
    upstream_rules()
        .args(["diff", "--baseline"])
        .arg(fixture("baseline.json"))
        .arg("--draft")
        .arg(fixture("draft-changed.json"))
        .assert()
        .success()
        .stdout(contains("changed"))
        .stdout(contains("unchanged").not());
}

#[test]
fn diff_invalid_draft_exits_one() {
    let output = upstream_rules()
        .args(["diff", "--format", "json", "--baseline"])
        .arg(fixture("baseline.json"))
        .arg("--draft")
        .arg(fixture("draft-invalid.json"))
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["save_eligible"], false);
    assert_eq!(v["issues"][0]["code"], "E2010");
}

#[test]
fn diff_generated_draft_matches_baseline() {
    let tmp = TempDir::new().expect("temp dir");
    let baseline = RuleSet {
        header_rules: Vec::new(),
        body_rules: vec![
            BodyRule::Insert {
                path: "messages".into(),
                index: 1,
                value: json!({"role": "user"}),
            },
            BodyRule::Append {
                path: "messages".into(),
                value: json!("tail"),
            },
        ],
    };
    let baseline_path = write_rule_set(tmp.path(), "baseline.json", &baseline).expect("write");
    let draft_path = write_draft(
        tmp.path(),
        "draft.json",
        &EditableRuleSet::from_canonical(&baseline),
    )
    .expect("write");

    let output = upstream_rules()
        .args(["diff", "--format", "json", "--baseline"])
        .arg(&baseline_path)
        .arg("--draft")
        .arg(&draft_path)
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["changed"], false);
    let canonical: RuleSet =
        serde_json::from_value(v["canonical"].clone()).expect("canonical rule set");
    assert_eq!(canonical, baseline);
}
