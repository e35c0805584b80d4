//! Per-field and cross-rule validation of editable rules.
//!
//! Validation is a pure function of the current rule list. Callers re-run it
//! after every mutation; a list is save-eligible when the report is empty.
//! Blank rows are skipped entirely.

use regex::RegexBuilder;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::editable::{BodyAction, EditableBodyRule, EditableHeaderRule, EditableRule, HeaderAction};
use crate::error::RuleError;
use crate::path::{parse_full, FieldPath};
use crate::reserved::{normalize, ReservedNames};

/// Which rule list an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Header,
    Body,
}

/// The editable field an issue is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Key,
    Value,
    From,
    To,
    Path,
    Index,
    Pattern,
    Flags,
}

impl RuleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleField::Key => "key",
            RuleField::Value => "value",
            RuleField::From => "from",
            RuleField::To => "to",
            RuleField::Path => "path",
            RuleField::Index => "index",
            RuleField::Pattern => "pattern",
            RuleField::Flags => "flags",
        }
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub kind: RuleKind,
    /// Zero-based index of the rule in its list.
    pub index: usize,
    pub field: RuleField,
    pub error: RuleError,
}

impl Serialize for FieldIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FieldIssue", 5)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("index", &self.index)?;
        s.serialize_field("field", &self.field)?;
        s.serialize_field("code", self.error.code())?;
        s.serialize_field("message", &self.error.to_string())?;
        s.end()
    }
}

/// Outcome of validating one or both rule lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<FieldIssue>,
}

impl ValidationReport {
    /// True when no rule carries an issue.
    pub fn is_save_eligible(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of one rule.
    pub fn issues_for(&self, kind: RuleKind, index: usize) -> impl Iterator<Item = &FieldIssue> {
        self.issues
            .iter()
            .filter(move |i| i.kind == kind && i.index == index)
    }

    /// The error attached to one field of one rule, if any.
    pub fn error_for(&self, kind: RuleKind, index: usize, field: RuleField) -> Option<&RuleError> {
        self.issues_for(kind, index)
            .find(|i| i.field == field)
            .map(|i| &i.error)
    }

    /// Append the issues of another report.
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    fn push_all(&mut self, kind: RuleKind, index: usize, issues: Vec<(RuleField, RuleError)>) {
        self.issues
            .extend(issues.into_iter().map(|(field, error)| FieldIssue {
                kind,
                index,
                field,
                error,
            }));
    }
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

/// Tri-state result of checking a JSON literal.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonLiteral {
    /// Nothing typed yet.
    Unset,
    /// Parses as JSON.
    Valid(Value),
    /// Typed but not JSON; carries the parser message.
    Invalid(String),
}

impl JsonLiteral {
    /// Classify raw JSON text.
    pub fn check(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return JsonLiteral::Unset;
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => JsonLiteral::Valid(value),
            Err(e) => JsonLiteral::Invalid(e.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, JsonLiteral::Valid(_))
    }

    /// The validation error for this state, if it is not valid.
    pub fn error(&self) -> Option<RuleError> {
        match self {
            JsonLiteral::Unset => Some(RuleError::EmptyValue),
            JsonLiteral::Valid(_) => None,
            JsonLiteral::Invalid(msg) => Some(RuleError::InvalidJson(msg.clone())),
        }
    }
}

/// Result of checking a regex pattern and its flags.
///
/// Pattern and flags are reported separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexCheck {
    pub pattern: Option<RuleError>,
    pub flags: Option<RuleError>,
}

impl RegexCheck {
    pub fn is_valid(&self) -> bool {
        self.pattern.is_none() && self.flags.is_none()
    }
}

/// Check a regex pattern and flag string.
///
/// Flags may only contain `i`, `m` and `s`, each at most once. Whitespace is
/// an invalid flag. Valid flags are applied when compiling the pattern.
///
/// Patterns use the `regex` crate syntax, which has no lookaround and no
/// backreferences. Patterns relying on either are reported as invalid.
pub fn check_regex(pattern: &str, flags: &str) -> RegexCheck {
    let parsed_flags = parse_flags(flags);

    let mut builder = RegexBuilder::new(pattern);
    if let Ok(flags) = &parsed_flags {
        builder
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'));
    }

    RegexCheck {
        pattern: builder
            .build()
            .err()
            .map(|e| RuleError::InvalidPattern(e.to_string())),
        flags: parsed_flags.err(),
    }
}

fn parse_flags(flags: &str) -> Result<String, RuleError> {
    let mut seen = String::new();
    for c in flags.chars() {
        if !matches!(c, 'i' | 'm' | 's') {
            return Err(RuleError::InvalidFlags(format!("unsupported flag '{}'", c)));
        }
        if seen.contains(c) {
            return Err(RuleError::InvalidFlags(format!("duplicate flag '{}'", c)));
        }
        seen.push(c);
    }
    Ok(seen)
}

/// Parse an insert index. Empty means append and yields `Ok(None)`.
pub fn check_index(raw: &str) -> Result<Option<i64>, RuleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| RuleError::InvalidIndex)
}

/// Normalized form of a body path used for conflict detection.
///
/// Returns `None` for empty or malformed paths.
fn path_key(raw: &str) -> Option<String> {
    parse_full(raw.trim()).ok().flatten().map(|p| p.to_string())
}

// ---------------------------------------------------------------------------
// Conflict detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimAction {
    Set,
    Drop,
    Rename,
    Other,
}

/// The names one rule claims, normalized.
#[derive(Debug)]
struct Claim {
    action: ClaimAction,
    key: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

impl Claim {
    fn header(rule: &EditableHeaderRule) -> Self {
        match rule.action {
            HeaderAction::Set | HeaderAction::Drop => Claim {
                action: if rule.action == HeaderAction::Set {
                    ClaimAction::Set
                } else {
                    ClaimAction::Drop
                },
                key: non_empty(normalize(&rule.key)),
                from: None,
                to: None,
            },
            HeaderAction::Rename => Claim {
                action: ClaimAction::Rename,
                key: None,
                from: non_empty(normalize(&rule.from)),
                to: non_empty(normalize(&rule.to)),
            },
        }
    }

    fn body(rule: &EditableBodyRule) -> Self {
        let (action, key, from, to) = match rule.action {
            BodyAction::Set => (ClaimAction::Set, path_key(&rule.path), None, None),
            BodyAction::Drop => (ClaimAction::Drop, path_key(&rule.path), None, None),
            BodyAction::Rename => (
                ClaimAction::Rename,
                None,
                path_key(&rule.from),
                path_key(&rule.to),
            ),
            BodyAction::Insert | BodyAction::RegexReplace => (ClaimAction::Other, None, None, None),
        };
        Claim {
            action,
            key,
            from,
            to,
        }
    }

    fn key_is(&self, name: &str) -> bool {
        self.key.as_deref() == Some(name)
    }

    fn from_is(&self, name: &str) -> bool {
        self.from.as_deref() == Some(name)
    }

    fn to_is(&self, name: &str) -> bool {
        self.to.as_deref() == Some(name)
    }
}

fn find_other<F>(claims: &[Claim], index: usize, hit: F) -> Option<usize>
where
    F: Fn(&Claim) -> bool,
{
    claims
        .iter()
        .enumerate()
        .find(|(j, c)| *j != index && hit(c))
        .map(|(j, _)| j)
}

/// A `Set`/`Drop` target collides with another `Set`/`Drop` target or `Rename.to`.
fn key_conflict(claims: &[Claim], index: usize, name: &str) -> Option<usize> {
    find_other(claims, index, |c| match c.action {
        ClaimAction::Set | ClaimAction::Drop => c.key_is(name),
        ClaimAction::Rename => c.to_is(name),
        ClaimAction::Other => false,
    })
}

/// A `Rename.from` source is already claimed by a `Set`, `Drop` or `Rename.from`.
fn from_conflict(claims: &[Claim], index: usize, name: &str) -> Option<usize> {
    find_other(claims, index, |c| match c.action {
        ClaimAction::Set | ClaimAction::Drop => c.key_is(name),
        ClaimAction::Rename => c.from_is(name),
        ClaimAction::Other => false,
    })
}

/// A `Rename.to` target collides with a `Set` target or another `Rename.to`.
fn to_conflict(claims: &[Claim], index: usize, name: &str) -> Option<usize> {
    find_other(claims, index, |c| match c.action {
        ClaimAction::Set => c.key_is(name),
        ClaimAction::Rename => c.to_is(name),
        ClaimAction::Drop | ClaimAction::Other => false,
    })
}

fn conflict(name: String, other: Option<usize>) -> Result<(), RuleError> {
    match other {
        Some(other) => Err(RuleError::Conflict { name, other }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Header rules
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum NameRole {
    Key,
    From,
    To,
}

fn check_header_name(
    raw: &str,
    field: &'static str,
    role: NameRole,
    claims: &[Claim],
    index: usize,
    reserved: &ReservedNames,
) -> Result<(), RuleError> {
    let name = normalize(raw);
    if name.is_empty() {
        return Err(RuleError::MissingField(field));
    }
    if !matches!(role, NameRole::From) && reserved.is_reserved_header(&name) {
        return Err(RuleError::ReservedHeader(name));
    }
    let other = match role {
        NameRole::Key => key_conflict(claims, index, &name),
        NameRole::From => from_conflict(claims, index, &name),
        NameRole::To => to_conflict(claims, index, &name),
    };
    conflict(raw.trim().to_string(), other)
}

fn header_issues(
    rule: &EditableHeaderRule,
    claims: &[Claim],
    index: usize,
    reserved: &ReservedNames,
) -> Vec<(RuleField, RuleError)> {
    let mut issues = Vec::new();
    if rule.is_blank() {
        return issues;
    }

    let mut check = |field: RuleField, result: Result<(), RuleError>| {
        if let Err(e) = result {
            issues.push((field, e));
        }
    };

    match rule.action {
        HeaderAction::Set | HeaderAction::Drop => check(
            RuleField::Key,
            check_header_name(&rule.key, "key", NameRole::Key, claims, index, reserved),
        ),
        HeaderAction::Rename => {
            check(
                RuleField::From,
                check_header_name(&rule.from, "from", NameRole::From, claims, index, reserved),
            );
            check(
                RuleField::To,
                check_header_name(&rule.to, "to", NameRole::To, claims, index, reserved),
            );
        }
    }

    issues
}

/// Issues of the header rule at `index`, checked against its siblings.
pub fn header_rule_issues(
    rules: &[EditableHeaderRule],
    index: usize,
    reserved: &ReservedNames,
) -> Vec<(RuleField, RuleError)> {
    let claims: Vec<Claim> = rules.iter().map(Claim::header).collect();
    match rules.get(index) {
        Some(rule) => header_issues(rule, &claims, index, reserved),
        None => Vec::new(),
    }
}

/// Validate a whole header rule list.
pub fn validate_header_rules(
    rules: &[EditableHeaderRule],
    reserved: &ReservedNames,
) -> ValidationReport {
    let claims: Vec<Claim> = rules.iter().map(Claim::header).collect();
    let mut report = ValidationReport::default();
    for (index, rule) in rules.iter().enumerate() {
        report.push_all(
            RuleKind::Header,
            index,
            header_issues(rule, &claims, index, reserved),
        );
    }
    tracing::debug!(rules = rules.len(), issues = report.len(), "validated header rules");
    report
}

// ---------------------------------------------------------------------------
// Body rules
// ---------------------------------------------------------------------------

/// Required, well-formed and not reserved. Returns the parsed path.
fn check_body_path(
    raw: &str,
    field: &'static str,
    reserved: &ReservedNames,
) -> Result<FieldPath, RuleError> {
    let path = parse_full(raw.trim())?.ok_or(RuleError::MissingField(field))?;
    if reserved.is_reserved_body_field(path.first_segment()) {
        return Err(RuleError::ReservedField(normalize(path.first_segment())));
    }
    Ok(path)
}

fn check_body_target(
    raw: &str,
    field: &'static str,
    role: NameRole,
    claims: &[Claim],
    index: usize,
    reserved: &ReservedNames,
) -> Result<(), RuleError> {
    let name = check_body_path(raw, field, reserved)?.to_string();
    let other = match role {
        NameRole::Key => key_conflict(claims, index, &name),
        NameRole::From => from_conflict(claims, index, &name),
        NameRole::To => to_conflict(claims, index, &name),
    };
    conflict(name, other)
}

fn body_issues(
    rule: &EditableBodyRule,
    claims: &[Claim],
    index: usize,
    reserved: &ReservedNames,
) -> Vec<(RuleField, RuleError)> {
    let mut issues = Vec::new();
    if rule.is_blank() {
        return issues;
    }

    let mut check = |field: RuleField, result: Result<(), RuleError>| {
        if let Err(e) = result {
            issues.push((field, e));
        }
    };
    let json = |raw: &str| match JsonLiteral::check(raw).error() {
        Some(e) => Err(e),
        None => Ok(()),
    };

    match rule.action {
        BodyAction::Set => {
            check(
                RuleField::Path,
                check_body_target(&rule.path, "path", NameRole::Key, claims, index, reserved),
            );
            check(RuleField::Value, json(&rule.value));
        }
        BodyAction::Drop => check(
            RuleField::Path,
            check_body_target(&rule.path, "path", NameRole::Key, claims, index, reserved),
        ),
        BodyAction::Rename => {
            check(
                RuleField::From,
                check_body_target(&rule.from, "from", NameRole::From, claims, index, reserved),
            );
            check(
                RuleField::To,
                check_body_target(&rule.to, "to", NameRole::To, claims, index, reserved),
            );
        }
        BodyAction::Insert => {
            check(
                RuleField::Path,
                check_body_path(&rule.path, "path", reserved).map(|_| ()),
            );
            check(RuleField::Index, check_index(&rule.index).map(|_| ()));
            check(RuleField::Value, json(&rule.value));
        }
        BodyAction::RegexReplace => {
            check(
                RuleField::Path,
                check_body_path(&rule.path, "path", reserved).map(|_| ()),
            );
            if rule.pattern.is_empty() {
                check(RuleField::Pattern, Err(RuleError::MissingField("pattern")));
                check(RuleField::Flags, parse_flags(&rule.flags).map(|_| ()));
            } else {
                let regex = check_regex(&rule.pattern, &rule.flags);
                check(RuleField::Pattern, regex.pattern.map_or(Ok(()), Err));
                check(RuleField::Flags, regex.flags.map_or(Ok(()), Err));
            }
        }
    }

    issues
}

/// Issues of the body rule at `index`, checked against its siblings.
pub fn body_rule_issues(
    rules: &[EditableBodyRule],
    index: usize,
    reserved: &ReservedNames,
) -> Vec<(RuleField, RuleError)> {
    let claims: Vec<Claim> = rules.iter().map(Claim::body).collect();
    match rules.get(index) {
        Some(rule) => body_issues(rule, &claims, index, reserved),
        None => Vec::new(),
    }
}

/// Validate a whole body rule list.
pub fn validate_body_rules(rules: &[EditableBodyRule], reserved: &ReservedNames) -> ValidationReport {
    let claims: Vec<Claim> = rules.iter().map(Claim::body).collect();
    let mut report = ValidationReport::default();
    for (index, rule) in rules.iter().enumerate() {
        report.push_all(
            RuleKind::Body,
            index,
            body_issues(rule, &claims, index, reserved),
        );
    }
    tracing::debug!(rules = rules.len(), issues = report.len(), "validated body rules");
    report
}
