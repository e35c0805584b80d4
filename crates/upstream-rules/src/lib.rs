//! Request rewrite rules for upstream AI-API providers.
//!
//! Describes how HTTP headers and JSON request bodies are mutated before a
//! request is forwarded upstream. This crate owns:
//! - the dotted field-path grammar (`a.b`, `a\.b`, `messages[0].content`)
//! - canonical header/body rule types and their wire format
//! - the editable rule records used while authoring
//! - validation (reserved names, conflicts, JSON literals, regex patterns)
//! - canonicalization between editable and persisted form
//! - change detection against the last persisted baseline
//!
//! Applying rules to live traffic happens elsewhere.

pub mod canonical;
pub mod changes;
pub mod editable;
pub mod error;
pub mod loader;
pub mod model;
pub mod path;
pub mod reserved;
pub mod ruleset;
pub mod validate;

pub use canonical::{canonicalize_all, json_value, load_all, Canonicalize};
pub use changes::has_changes;
pub use editable::{
    BodyAction, EditableBodyRule, EditableHeaderRule, EditableRule, HeaderAction, RuleList,
};
pub use error::{LoadError, PathError, RuleError};
pub use loader::{load_draft, load_rule_set};
pub use model::{BodyRule, HeaderRule, RuleSet};
pub use path::{check_index_suffix, parse_path, FieldPath};
pub use reserved::{ReservedNames, RESERVED_BODY_FIELDS, RESERVED_HEADERS};
pub use ruleset::EditableRuleSet;
pub use validate::{
    body_rule_issues, check_index, check_regex, header_rule_issues, validate_body_rules,
    validate_header_rules, FieldIssue, JsonLiteral, RegexCheck, RuleField, RuleKind,
    ValidationReport,
};
