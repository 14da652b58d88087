use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating an intent.
///
/// There is no implicit allow: every path through the engine ends in one of
/// these, and anything the engine cannot prove safe is `RequireApproval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Sign without asking.
    Allow,
    /// Ask the human first.
    RequireApproval(String),
    /// Refuse outright.
    Deny(String),
}

impl Decision {
    /// Check if the intent may be signed immediately.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Check if the intent needs a human approval.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::RequireApproval(_))
    }

    /// Check if the intent is refused.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// The reason carried by a non-allow decision.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::RequireApproval(reason) | Self::Deny(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::RequireApproval(reason) => write!(f, "requires approval: {reason}"),
            Self::Deny(reason) => write!(f, "denied: {reason}"),
        }
    }
}
