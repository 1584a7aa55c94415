//! Automation: "when trigger holds, perform actions" rules.
//!
//! A [`Rule`] owns one [`Trigger`] and an ordered list of [`Action`]s. Both
//! are persisted as tagged [`Record`]s and rebuilt through the
//! [`Registry`], which tolerates variants this build does not know.

mod action;
pub mod codec;
mod comparator;
mod presentation;
mod record;
mod registry;
mod trigger;

pub use action::{Action, Effect, LoopSuspend, ProfileSwitchPercent, TempTarget};
pub use comparator::Comparator;
pub use presentation::Presentation;
pub use record::Record;
pub use registry::{Registry, RegistryBuilder};
pub use trigger::{Comparison, Flag, FlagCheck, Input, Trigger};

use serde::{Deserialize, Serialize};

use crate::error::{LoopRuleError, ValidationError};
use crate::id::RuleId;
use crate::time::Timestamp;

/// A trigger paired with the actions to run when it starts holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub enabled: bool,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
    pub last_fired: Option<Timestamp>,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the trigger is not valid ([`ValidationError::InvalidTrigger`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - an action is not valid ([`ValidationError::InvalidAction`])
    pub fn validate(&self) -> Result<(), LoopRuleError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !self.trigger.is_valid() {
            return Err(ValidationError::InvalidTrigger.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        if let Some((index, action)) = self
            .actions
            .iter()
            .enumerate()
            .find(|(_, action)| !action.is_valid())
        {
            return Err(ValidationError::InvalidAction {
                index,
                kind: action.kind(),
            }
            .into());
        }
        Ok(())
    }

    /// `true` when [`Rule::validate`] would succeed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<Trigger>,
    actions: Vec<Action>,
    last_fired: Option<Timestamp>,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    #[must_use]
    pub fn last_fired(mut self, ts: Timestamp) -> Self {
        self.last_fired = Some(ts);
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::Validation`] if the rule breaks an invariant.
    /// A missing trigger counts as an invalid one.
    pub fn build(self) -> Result<Rule, LoopRuleError> {
        let rule = Rule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            trigger: self.trigger.unwrap_or_else(|| Trigger::And(Vec::new())),
            actions: self.actions,
            last_fired: self.last_fired,
        };
        rule.validate()?;
        Ok(rule)
    }
}
