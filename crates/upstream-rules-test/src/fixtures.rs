//! Shared rule-set fixtures.

use std::io;
use std::path::{Path, PathBuf};

use upstream_rules::{EditableRuleSet, RuleSet};

/// Absolute path to the shared test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/upstream-rules-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
}

/// Path of a named fixture file.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Write a canonical rule set as JSON into `dir` and return its path.
pub fn write_rule_set(dir: &Path, name: &str, rules: &RuleSet) -> io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(rules)?)?;
    Ok(path)
}

/// Write an editable draft as JSON into `dir` and return its path.
pub fn write_draft(dir: &Path, name: &str, draft: &EditableRuleSet) -> io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(draft)?)?;
    Ok(path)
}
