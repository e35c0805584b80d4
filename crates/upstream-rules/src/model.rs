//! Canonical rule types, as persisted by the server.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A header rewrite rule. Header names match case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HeaderRule {
    /// Force the header to `value`.
    Set {
        #[serde(deserialize_with = "trimmed")]
        key: String,
        value: String,
    },
    /// Remove the header if present.
    Drop {
        #[serde(deserialize_with = "trimmed")]
        key: String,
    },
    /// Rename header `from` to `to`, keeping its value.
    Rename {
        #[serde(deserialize_with = "trimmed")]
        from: String,
        #[serde(deserialize_with = "trimmed")]
        to: String,
    },
}

/// A JSON request body rewrite rule, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BodyRule {
    /// Force the field at `path` to `value`.
    Set {
        #[serde(deserialize_with = "trimmed")]
        path: String,
        value: Value,
    },
    /// Remove the field at `path`.
    Drop {
        #[serde(deserialize_with = "trimmed")]
        path: String,
    },
    /// Move a field from one path to another.
    Rename {
        #[serde(deserialize_with = "trimmed")]
        from: String,
        #[serde(deserialize_with = "trimmed")]
        to: String,
    },
    /// Insert `value` into the array at `path` at position `index`.
    Insert {
        #[serde(deserialize_with = "trimmed")]
        path: String,
        index: i64,
        value: Value,
    },
    /// Append `value` to the array at `path`.
    Append {
        #[serde(deserialize_with = "trimmed")]
        path: String,
        value: Value,
    },
    /// Replace `pattern` matches in the string at `path`.
    RegexReplace {
        #[serde(deserialize_with = "trimmed")]
        path: String,
        pattern: String,
        replacement: String,
        #[serde(
            default,
            deserialize_with = "blank_as_none",
            skip_serializing_if = "Option::is_none"
        )]
        flags: Option<String>,
    },
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

// An empty flag string means no flags.
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|flags| !flags.trim().is_empty()))
}

/// Header and body rules of one endpoint configuration.
///
/// Persisted as a whole; list order is application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub header_rules: Vec<HeaderRule>,

    #[serde(default)]
    pub body_rules: Vec<BodyRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the rule set holds no rules at all.
    pub fn is_empty(&self) -> bool {
        self.header_rules.is_empty() && self.body_rules.is_empty()
    }
}
