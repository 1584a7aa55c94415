//! Rule repository port: persistence for rules.

use std::future::Future;

use looprule_domain::automation::Rule;
use looprule_domain::error::LoopRuleError;
use looprule_domain::id::RuleId;
use looprule_domain::time::Timestamp;

/// Repository for persisting and querying [`Rule`]s.
///
/// Implementations keep rules in insertion order and store them as given:
/// validation happens in the service layer, and imported rules may be
/// invalid.
pub trait RuleRepository {
    /// Create a new rule in storage.
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send;

    /// Get a rule by its unique identifier.
    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, LoopRuleError>> + Send;

    /// Get all rules.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send;

    /// Get all enabled rules.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send;

    /// Update an existing rule.
    fn update(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send;

    /// Delete a rule by its unique identifier.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), LoopRuleError>> + Send;

    /// Stamp the time a rule last fired.
    fn record_fired(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), LoopRuleError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for std::sync::Arc<T> {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, LoopRuleError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send {
        (**self).get_all()
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, LoopRuleError>> + Send {
        (**self).get_enabled()
    }

    fn update(&self, rule: Rule) -> impl Future<Output = Result<Rule, LoopRuleError>> + Send {
        (**self).update(rule)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        (**self).delete(id)
    }

    fn record_fired(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        (**self).record_fired(id, at)
    }
}
