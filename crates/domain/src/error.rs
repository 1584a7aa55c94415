//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`LoopRuleError`] via `#[from]` (or an explicit `From` impl for errors
//! that live in adapter crates).

/// Top-level error shared by every port and service.
#[derive(Debug, thiserror::Error)]
pub enum LoopRuleError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A persistence adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Structural problems with a rule, surfaced to the editor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The rule has an empty name.
    #[error("name must not be empty")]
    EmptyName,

    /// The rule has no action to perform.
    #[error("at least one action is required")]
    NoActions,

    /// The rule trigger has an operand outside its domain, or an empty
    /// combinator.
    #[error("trigger is not valid")]
    InvalidTrigger,

    /// An action has a field outside its domain.
    #[error("action #{index} ({kind}) is not valid")]
    InvalidAction {
        /// Position of the action in the rule.
        index: usize,
        /// Kind tag of the offending action.
        kind: &'static str,
    },

    /// A textual identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A rule-set document could not be parsed at all.
    #[error("malformed rule set: {0}")]
    MalformedRuleSet(String),
}

/// The requested item was not found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of item looked up, e.g. `"Rule"`.
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}
