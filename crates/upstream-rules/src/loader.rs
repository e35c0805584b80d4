//! Reading rule sets and drafts from JSON or YAML files.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::LoadError;
use crate::model::RuleSet;
use crate::ruleset::EditableRuleSet;

/// Deserialize a document, choosing YAML or JSON by file extension.
///
/// `.yaml` and `.yml` are read as YAML; anything else as JSON.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Load a persisted rule set.
pub fn load_rule_set(path: &Path) -> Result<RuleSet, LoadError> {
    let rules: RuleSet = read_document(path)?;
    tracing::debug!(
        file = %path.display(),
        header_rules = rules.header_rules.len(),
        body_rules = rules.body_rules.len(),
        "loaded rule set"
    );
    Ok(rules)
}

/// Load an in-progress editable draft.
pub fn load_draft(path: &Path) -> Result<EditableRuleSet, LoadError> {
    read_document(path)
}
