//! Protected header names and top-level body fields.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::LoadError;
use crate::loader::read_document;

/// Headers no rule may set, drop or rename onto.
pub const RESERVED_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-goog-api-key",
    "content-type",
    "content-length",
    "host",
];

/// Top-level body fields no rule may target.
pub const RESERVED_BODY_FIELDS: &[&str] = &["model", "stream"];

/// Reserved-name tables used by the validator.
///
/// Names are stored trimmed and lower-cased. The default holds
/// [`RESERVED_HEADERS`] and [`RESERVED_BODY_FIELDS`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservedNames {
    #[serde(default, deserialize_with = "normalized_set")]
    headers: BTreeSet<String>,

    #[serde(default, deserialize_with = "normalized_set")]
    body_fields: BTreeSet<String>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            headers: RESERVED_HEADERS.iter().map(|s| s.to_string()).collect(),
            body_fields: RESERVED_BODY_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Wrapper matching the `reserved:` key of an override file.
#[derive(Deserialize)]
struct ReservedFile {
    reserved: ReservedNames,
}

impl ReservedNames {
    /// Create the default tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty tables (nothing reserved).
    pub fn empty() -> Self {
        Self {
            headers: BTreeSet::new(),
            body_fields: BTreeSet::new(),
        }
    }

    /// Load tables from a YAML or JSON file with a top-level `reserved` key.
    ///
    /// Lists in the file replace the defaults; an omitted list is empty.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let file: ReservedFile = read_document(path)?;
        Ok(file.reserved)
    }

    /// Add a reserved header name.
    pub fn with_header(mut self, name: impl AsRef<str>) -> Self {
        self.headers.insert(normalize(name.as_ref()));
        self
    }

    /// Add a reserved top-level body field.
    pub fn with_body_field(mut self, name: impl AsRef<str>) -> Self {
        self.body_fields.insert(normalize(name.as_ref()));
        self
    }

    /// Whether `name` is a reserved header (case-insensitive, trimmed).
    pub fn is_reserved_header(&self, name: &str) -> bool {
        self.headers.contains(&normalize(name))
    }

    /// Whether `segment` is a reserved top-level body field.
    pub fn is_reserved_body_field(&self, segment: &str) -> bool {
        self.body_fields.contains(&normalize(segment))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn body_fields(&self) -> impl Iterator<Item = &str> {
        self.body_fields.iter().map(String::as_str)
    }
}

/// Trim and lower-case a name for comparison.
pub(crate) fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalized_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names.iter().map(|n| normalize(n)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tables() {
        let reserved = ReservedNames::default();
        assert!(reserved.is_reserved_header("Authorization"));
        assert!(reserved.is_reserved_header("  X-API-KEY "));
        assert!(reserved.is_reserved_header("host"));
        assert!(!reserved.is_reserved_header("x-request-id"));
        assert!(reserved.is_reserved_body_field("model"));
        assert!(reserved.is_reserved_body_field("Stream"));
        assert!(!reserved.is_reserved_body_field("messages"));
    }

    #[test]
    fn test_builder_extends_defaults() {
        let reserved = ReservedNames::new()
            .with_header("X-Tenant")
            .with_body_field("user");
        assert!(reserved.is_reserved_header("x-tenant"));
        assert!(reserved.is_reserved_body_field("USER"));
        assert!(reserved.is_reserved_header("authorization"));
    }

    #[test]
    fn test_empty_reserves_nothing() {
        let reserved = ReservedNames::empty();
        assert!(!reserved.is_reserved_header("authorization"));
        assert_eq!(reserved.headers().count(), 0);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "reserved:\n  headers: [\"X-Secret\"]\n  body_fields: [Model]").unwrap();

        let reserved = ReservedNames::from_file(file.path()).unwrap();
        assert!(reserved.is_reserved_header("x-secret"));
        assert!(!reserved.is_reserved_header("authorization"));
        assert_eq!(reserved.body_fields().collect::<Vec<_>>(), vec!["model"]);
    }
}
