use thiserror::Error;

/// Error produced by the body path grammar.
///
/// Every malformed dotted path maps to the same variant, so callers never
/// special-case leading, trailing or doubled dots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path format")]
    InvalidFormat,
}

/// A validation failure scoped to one field of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// E2001: Path is not a valid dotted field path.
    #[error("invalid path format")]
    InvalidPath,

    /// E2002: Required field left empty on a partially filled rule.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// E2003: Header name is protected.
    #[error("header '{0}' is reserved and cannot be modified")]
    ReservedHeader(String),

    /// E2004: Top-level body field is protected.
    #[error("body field '{0}' is reserved and cannot be modified")]
    ReservedField(String),

    /// E2005: Another rule already targets the same name or path.
    ///
    /// `other` is the zero-based list index of the conflicting rule.
    #[error("'{name}' conflicts with rule #{}", .other + 1)]
    Conflict { name: String, other: usize },

    /// E2006: JSON literal left empty.
    #[error("value must not be empty")]
    EmptyValue,

    /// E2007: JSON literal does not parse.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// E2008: Regex pattern does not compile.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(String),

    /// E2009: Regex flags outside of `i`, `m`, `s` or repeated.
    #[error("invalid regex flags: {0}")]
    InvalidFlags(String),

    /// E2010: Insert index is not an integer.
    #[error("index must be an integer")]
    InvalidIndex,
}

impl RuleError {
    /// Stable error code for machine-readable reports.
    pub fn code(&self) -> &'static str {
        match self {
            RuleError::InvalidPath => "E2001",
            RuleError::MissingField(_) => "E2002",
            RuleError::ReservedHeader(_) => "E2003",
            RuleError::ReservedField(_) => "E2004",
            RuleError::Conflict { .. } => "E2005",
            RuleError::EmptyValue => "E2006",
            RuleError::InvalidJson(_) => "E2007",
            RuleError::InvalidPattern(_) => "E2008",
            RuleError::InvalidFlags(_) => "E2009",
            RuleError::InvalidIndex => "E2010",
        }
    }
}

impl From<PathError> for RuleError {
    fn from(_: PathError) -> Self {
        RuleError::InvalidPath
    }
}

/// Errors produced while loading rule sets and reserved-name tables from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_regex_failures() {
        let pattern = RuleError::InvalidPattern("x".into());
        let flags = RuleError::InvalidFlags("x".into());
        assert_ne!(pattern.code(), flags.code());
        assert_ne!(pattern, flags);
    }

    #[test]
    fn test_messages() {
        assert_eq!(RuleError::InvalidPath.to_string(), "invalid path format");
        assert_eq!(RuleError::EmptyValue.to_string(), "value must not be empty");
        assert_eq!(
            RuleError::Conflict {
                name: "x-trace".into(),
                other: 2
            }
            .to_string(),
            "'x-trace' conflicts with rule #3"
        );
        assert_eq!(RuleError::from(PathError::InvalidFormat), RuleError::InvalidPath);
    }
}
