//! Conversion between editable rules and the canonical persisted form.
//!
//! Saving drops rows whose required fields are empty, trims header names and
//! field paths, and maps an insert with an empty index to `append`. Loading maps `append` back to an insert with an
//! empty index, so `canonicalize(from_canonical(r)) == r` for every canonical
//! rule `r`.

use serde_json::Value;

use crate::editable::{
    BodyAction, EditableBodyRule, EditableHeaderRule, EditableRule, HeaderAction, RuleList,
};
use crate::model::{BodyRule, HeaderRule};
use crate::validate::check_index;

/// An editable rule with a canonical counterpart.
pub trait Canonicalize: EditableRule {
    type Canonical: Clone + PartialEq;

    /// Editable form of a persisted rule.
    fn from_canonical(rule: &Self::Canonical) -> Self;

    /// Canonical form, or `None` when required fields are empty.
    fn canonicalize(&self) -> Option<Self::Canonical>;
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

fn name(s: &str) -> String {
    s.trim().to_string()
}

/// Parse a value as JSON, falling back to a JSON string of the raw text.
pub fn json_value(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl Canonicalize for EditableHeaderRule {
    type Canonical = HeaderRule;

    fn from_canonical(rule: &HeaderRule) -> Self {
        match rule {
            HeaderRule::Set { key, value } => EditableHeaderRule {
                action: HeaderAction::Set,
                key: key.clone(),
                value: value.clone(),
                ..Default::default()
            },
            HeaderRule::Drop { key } => EditableHeaderRule {
                action: HeaderAction::Drop,
                key: key.clone(),
                ..Default::default()
            },
            HeaderRule::Rename { from, to } => EditableHeaderRule {
                action: HeaderAction::Rename,
                from: from.clone(),
                to: to.clone(),
                ..Default::default()
            },
        }
    }

    fn canonicalize(&self) -> Option<HeaderRule> {
        match self.action {
            HeaderAction::Set if filled(&self.key) => Some(HeaderRule::Set {
                key: name(&self.key),
                value: self.value.clone(),
            }),
            HeaderAction::Drop if filled(&self.key) => Some(HeaderRule::Drop {
                key: name(&self.key),
            }),
            HeaderAction::Rename if filled(&self.from) && filled(&self.to) => {
                Some(HeaderRule::Rename {
                    from: name(&self.from),
                    to: name(&self.to),
                })
            }
            _ => None,
        }
    }
}

impl Canonicalize for EditableBodyRule {
    type Canonical = BodyRule;

    fn from_canonical(rule: &BodyRule) -> Self {
        match rule {
            BodyRule::Set { path, value } => EditableBodyRule {
                action: BodyAction::Set,
                path: path.clone(),
                value: value.to_string(),
                ..Default::default()
            },
            BodyRule::Drop { path } => EditableBodyRule {
                action: BodyAction::Drop,
                path: path.clone(),
                ..Default::default()
            },
            BodyRule::Rename { from, to } => EditableBodyRule {
                action: BodyAction::Rename,
                from: from.clone(),
                to: to.clone(),
                ..Default::default()
            },
            BodyRule::Insert { path, index, value } => EditableBodyRule {
                action: BodyAction::Insert,
                path: path.clone(),
                index: index.to_string(),
                value: value.to_string(),
                ..Default::default()
            },
            BodyRule::Append { path, value } => EditableBodyRule {
                action: BodyAction::Insert,
                path: path.clone(),
                index: String::new(),
                value: value.to_string(),
                ..Default::default()
            },
            BodyRule::RegexReplace {
                path,
                pattern,
                replacement,
                flags,
            } => EditableBodyRule {
                action: BodyAction::RegexReplace,
                path: path.clone(),
                pattern: pattern.clone(),
                replacement: replacement.clone(),
                flags: flags.clone().unwrap_or_default(),
                ..Default::default()
            },
        }
    }

    fn canonicalize(&self) -> Option<BodyRule> {
        match self.action {
            BodyAction::Set if filled(&self.path) && filled(&self.value) => Some(BodyRule::Set {
                path: name(&self.path),
                value: json_value(&self.value),
            }),
            BodyAction::Drop if filled(&self.path) => Some(BodyRule::Drop {
                path: name(&self.path),
            }),
            BodyAction::Rename if filled(&self.from) && filled(&self.to) => {
                Some(BodyRule::Rename {
                    from: name(&self.from),
                    to: name(&self.to),
                })
            }
            BodyAction::Insert if filled(&self.path) && filled(&self.value) => {
                let path = name(&self.path);
                let value = json_value(&self.value);
                match check_index(&self.index) {
                    Ok(Some(index)) => Some(BodyRule::Insert { path, index, value }),
                    Ok(None) => Some(BodyRule::Append { path, value }),
                    Err(_) => {
                        tracing::debug!(
                            path = %self.path,
                            index = %self.index,
                            "skipping insert with non-integer index"
                        );
                        None
                    }
                }
            }
            BodyAction::RegexReplace if filled(&self.path) && !self.pattern.is_empty() => {
                Some(BodyRule::RegexReplace {
                    path: name(&self.path),
                    pattern: self.pattern.clone(),
                    replacement: self.replacement.clone(),
                    flags: filled(&self.flags).then(|| self.flags.clone()),
                })
            }
            _ => None,
        }
    }
}

/// Canonicalize a rule list, skipping incomplete rows and keeping order.
pub fn canonicalize_all<R: Canonicalize>(rules: &[R]) -> Vec<R::Canonical> {
    let canonical: Vec<R::Canonical> = rules.iter().filter_map(R::canonicalize).collect();
    if canonical.len() < rules.len() {
        tracing::debug!(
            skipped = rules.len() - canonical.len(),
            kept = canonical.len(),
            "skipped incomplete rules"
        );
    }
    canonical
}

/// Load persisted rules into an editable list.
pub fn load_all<R: Canonicalize>(rules: &[R::Canonical]) -> RuleList<R> {
    rules.iter().map(R::from_canonical).collect()
}
