//! Editable rule records.
//!
//! An editable rule holds text inputs for every action at once, so a row
//! being authored can keep partially typed input. Only the fields of the
//! current action are meaningful; all fields are cleared when the action
//! changes. Editable rules are never persisted; they are turned into
//! [`HeaderRule`](crate::HeaderRule) / [`BodyRule`](crate::BodyRule) values
//! by the canonicalizer.

use serde::{Deserialize, Serialize};

/// Action selector of an editable header rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderAction {
    #[default]
    Set,
    Drop,
    Rename,
}

/// Action selector of an editable body rule.
///
/// There is no `Append`: an insert with an empty index is an append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyAction {
    #[default]
    Set,
    Drop,
    Rename,
    Insert,
    RegexReplace,
}

/// Behaviour shared by editable header and body rules.
pub trait EditableRule: Default {
    /// The action discriminator.
    type Action: Copy + PartialEq;

    /// Current action.
    fn action(&self) -> Self::Action;

    /// Switch to `action`, clearing every text field.
    ///
    /// Setting the current action again leaves the rule untouched.
    fn set_action(&mut self, action: Self::Action);

    /// Whether every text field is empty (a freshly added, untouched row).
    fn is_blank(&self) -> bool;
}

/// Editable header rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditableHeaderRule {
    pub action: HeaderAction,
    pub key: String,
    pub value: String,
    pub from: String,
    pub to: String,
}

impl EditableHeaderRule {
    /// Create an empty rule with the given action.
    pub fn new(action: HeaderAction) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }
}

impl EditableRule for EditableHeaderRule {
    type Action = HeaderAction;

    fn action(&self) -> HeaderAction {
        self.action
    }

    fn set_action(&mut self, action: HeaderAction) {
        if self.action == action {
            return;
        }
        *self = Self::new(action);
    }

    fn is_blank(&self) -> bool {
        [&self.key, &self.value, &self.from, &self.to]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

/// Editable body rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditableBodyRule {
    pub action: BodyAction,
    pub path: String,
    /// JSON text of the value for `set` and `insert`.
    pub value: String,
    pub from: String,
    pub to: String,
    /// Integer text; empty means append.
    pub index: String,
    pub pattern: String,
    pub replacement: String,
    pub flags: String,
}

impl EditableBodyRule {
    /// Create an empty rule with the given action.
    pub fn new(action: BodyAction) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }
}

impl EditableRule for EditableBodyRule {
    type Action = BodyAction;

    fn action(&self) -> BodyAction {
        self.action
    }

    fn set_action(&mut self, action: BodyAction) {
        if self.action == action {
            return;
        }
        *self = Self::new(action);
    }

    fn is_blank(&self) -> bool {
        [
            &self.path,
            &self.value,
            &self.from,
            &self.to,
            &self.index,
            &self.pattern,
            &self.replacement,
            &self.flags,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }
}

/// Ordered list of editable rules.
///
/// Authoring order is application order and is preserved by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleList<R> {
    rules: Vec<R>,
}

impl<R> Default for RuleList<R> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<R: EditableRule> RuleList<R> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blank rule and return its index.
    pub fn add(&mut self) -> usize {
        self.rules.push(R::default());
        self.rules.len() - 1
    }

    /// Remove the rule at `index`.
    pub fn remove(&mut self, index: usize) -> Option<R> {
        if index < self.rules.len() {
            Some(self.rules.remove(index))
        } else {
            None
        }
    }

    /// Change the action of the rule at `index` in place.
    ///
    /// Returns `false` if there is no rule at `index`.
    pub fn change_action(&mut self, index: usize, action: R::Action) -> bool {
        match self.rules.get_mut(index) {
            Some(rule) => {
                rule.set_action(action);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.rules.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut R> {
        self.rules.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<R> From<Vec<R>> for RuleList<R> {
    fn from(rules: Vec<R>) -> Self {
        Self { rules }
    }
}

impl<R> FromIterator<R> for RuleList<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a, R> IntoIterator for &'a RuleList<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_blank_rule() {
        let mut list: RuleList<EditableHeaderRule> = RuleList::new();
        assert_eq!(list.add(), 0);
        assert_eq!(list.add(), 1);
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(EditableRule::is_blank));
    }

    #[test]
    fn test_remove_by_index_keeps_order() {
        let mut list: RuleList<EditableHeaderRule> = ["a", "b", "c"]
            .iter()
            .map(|k| EditableHeaderRule {
                key: k.to_string(),
                ..Default::default()
            })
            .collect();

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.key, "b");
        let keys: Vec<_> = list.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert!(list.remove(5).is_none());
    }

    #[test]
    fn test_change_action_clears_fields_in_place() {
        let mut list: RuleList<EditableBodyRule> = RuleList::new();
        list.add();
        let idx = list.add();
        {
            let rule = list.get_mut(idx).unwrap();
            rule.path = "messages".into();
            rule.value = "{\"role\":\"system\"}".into();
            rule.pattern = "stale".into();
        }

        assert!(list.change_action(idx, BodyAction::Insert));
        assert_eq!(list.len(), 2);
        let rule = list.get(idx).unwrap();
        assert_eq!(rule.action, BodyAction::Insert);
        assert!(rule.is_blank());
        assert!(!list.change_action(9, BodyAction::Drop));
    }

    #[test]
    fn test_same_action_keeps_fields() {
        let mut rule = EditableHeaderRule {
            action: HeaderAction::Drop,
            key: "x-debug".into(),
            ..Default::default()
        };
        rule.set_action(HeaderAction::Drop);
        assert_eq!(rule.key, "x-debug");
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        let rule = EditableBodyRule {
            path: "  ".into(),
            ..Default::default()
        };
        assert!(rule.is_blank());
    }

    #[test]
    fn test_editable_deserializes_with_defaults() {
        let rule: EditableBodyRule =
            serde_json::from_str(r#"{"action":"insert","path":"messages"}"#).unwrap();
        assert_eq!(rule.action, BodyAction::Insert);
        assert_eq!(rule.index, "");
    }
}
