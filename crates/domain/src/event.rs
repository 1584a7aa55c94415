//! Event: an immutable record of something the rule engine did.
//!
//! Events are produced when a rule fires and for every action it executes
//! or skips.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, RuleId};
use crate::time::Timestamp;

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A rule's trigger went from false to true and its actions started.
    RuleFired,
    /// An action reported success.
    ActionSucceeded,
    /// An action reported failure.
    ActionFailed,
    /// An action was not run (invalid or failing precondition).
    ActionSkipped,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RuleFired => "rule_fired",
            Self::ActionSucceeded => "action_succeeded",
            Self::ActionFailed => "action_failed",
            Self::ActionSkipped => "action_skipped",
        };
        f.write_str(s)
    }
}

/// Something that happened, optionally tied to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub rule_id: Option<RuleId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, rule_id: Option<RuleId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            rule_id,
            data,
            timestamp: crate::time::now(),
        }
    }
}
