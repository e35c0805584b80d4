//! Editable rule set: both lists of one endpoint, edited together.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonicalize_all, load_all};
use crate::changes::has_changes;
use crate::editable::{EditableBodyRule, EditableHeaderRule, RuleList};
use crate::model::RuleSet;
use crate::reserved::ReservedNames;
use crate::validate::{validate_body_rules, validate_header_rules, ValidationReport};

/// Draft of an endpoint's header and body rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditableRuleSet {
    pub header_rules: RuleList<EditableHeaderRule>,
    pub body_rules: RuleList<EditableBodyRule>,
}

impl EditableRuleSet {
    /// An empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted rule set for editing.
    pub fn from_canonical(rules: &RuleSet) -> Self {
        Self {
            header_rules: load_all(&rules.header_rules),
            body_rules: load_all(&rules.body_rules),
        }
    }

    /// The rule set to persist on save.
    pub fn canonicalize(&self) -> RuleSet {
        RuleSet {
            header_rules: canonicalize_all(self.header_rules.as_slice()),
            body_rules: canonicalize_all(self.body_rules.as_slice()),
        }
    }

    /// Validate both lists.
    pub fn validate(&self, reserved: &ReservedNames) -> ValidationReport {
        let mut report = validate_header_rules(self.header_rules.as_slice(), reserved);
        report.merge(validate_body_rules(self.body_rules.as_slice(), reserved));
        report
    }

    /// Whether saving this draft would change `baseline`.
    pub fn has_changes(&self, baseline: &RuleSet) -> bool {
        has_changes(&baseline.header_rules, self.header_rules.as_slice())
            || has_changes(&baseline.body_rules, self.body_rules.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::{BodyAction, HeaderAction};
    use crate::model::{BodyRule, HeaderRule};
    use crate::validate::{RuleField, RuleKind};
    use serde_json::json;

    fn baseline() -> RuleSet {
        RuleSet {
            header_rules: vec![
                HeaderRule::Set {
                    key: "anthropic-version".into(),
                    value: "2023-06-01".into(),
                },
                HeaderRule::Drop {
                    key: "x-stainless-os".into(),
                },
            ],
            body_rules: vec![BodyRule::Append {
                path: "messages".into(),
                value: json!(1),
            }],
        }
    }

    #[test]
    fn test_load_then_save_is_identity() {
        let rules = baseline();
        let draft = EditableRuleSet::from_canonical(&rules);
        assert_eq!(draft.canonicalize(), rules);
        assert!(!draft.has_changes(&rules));
        assert!(draft.validate(&ReservedNames::default()).is_save_eligible());
    }

    #[test]
    fn test_edit_workflow() {
        let rules = baseline();
        let mut draft = EditableRuleSet::from_canonical(&rules);

        let idx = draft.header_rules.add();
        assert!(!draft.has_changes(&rules));
        assert!(draft.validate(&ReservedNames::default()).is_save_eligible());

        draft.header_rules.change_action(idx, HeaderAction::Set);
        draft.header_rules.get_mut(idx).unwrap().key = "X-Stainless-OS".into();
        let report = draft.validate(&ReservedNames::default());
        assert!(!report.is_save_eligible());
        assert!(report.error_for(RuleKind::Header, 1, RuleField::Key).is_some());
        assert!(report.error_for(RuleKind::Header, idx, RuleField::Key).is_some());

        draft.header_rules.get_mut(idx).unwrap().key = "x-tenant".into();
        assert!(draft.validate(&ReservedNames::default()).is_save_eligible());
        assert!(draft.has_changes(&rules));

        let saved = draft.canonicalize();
        assert_eq!(saved.header_rules.len(), 3);
        assert_eq!(
            saved.header_rules[2],
            HeaderRule::Set {
                key: "x-tenant".into(),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_body_change_detected_independently() {
        let rules = baseline();
        let mut draft = EditableRuleSet::from_canonical(&rules);
        let idx = draft.body_rules.add();
        draft.body_rules.change_action(idx, BodyAction::Drop);
        draft.body_rules.get_mut(idx).unwrap().path = "user".into();
        assert!(draft.has_changes(&rules));
    }

    #[test]
    fn test_draft_serde() {
        let draft = EditableRuleSet::from_canonical(&baseline());
        let text = serde_json::to_string(&draft).unwrap();
        let back: EditableRuleSet = serde_json::from_str(&text).unwrap();
        assert_eq!(back, draft);
        assert_eq!(back.body_rules.get(0).unwrap().action, BodyAction::Insert);
    }
}
