use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Condition;

/// A transient pairing of conditions with actions, applied once on demand.
///
/// Rules are not persisted by this crate; the settings layer that owns them
/// hands a fresh `Rule` to [`crate::rules::RuleEngine::apply`] per
/// invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

/// A named mutation applied to one matching article by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Action-specific operands, e.g. `{"category": "archive"}` for
    /// `relabel`. Unused keys are ignored.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MarkRead,
    MarkUnread,
    Star,
    Unstar,
    Delete,
    Relabel,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkRead => "mark_read",
            Self::MarkUnread => "mark_unread",
            Self::Star => "star",
            Self::Unstar => "unstar",
            Self::Delete => "delete",
            Self::Relabel => "relabel",
        }
    }
}
