//! Rule service: use-cases for managing rules and rule sets.

use looprule_domain::automation::codec::{decode_rule_set, encode_rule_set};
use looprule_domain::automation::{Registry, Rule};
use looprule_domain::error::{LoopRuleError, NotFoundError};
use looprule_domain::id::RuleId;

use crate::ports::RuleRepository;

/// Counts reported by [`RuleService::import_rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Rules that did not exist and were created.
    pub created: usize,
    /// Rules whose id already existed and were overwritten.
    pub updated: usize,
    /// Imported rules that fail validation. They are stored anyway and
    /// never fire until fixed.
    pub invalid: usize,
}

/// Application service for rule CRUD and rule-set import/export.
pub struct RuleService<R> {
    repo: R,
    registry: &'static Registry,
}

impl<R: RuleRepository> RuleService<R> {
    /// Create a new service backed by the given repository, decoding with
    /// the process-wide registry.
    pub fn new(repo: R) -> Self {
        Self::with_registry(repo, Registry::global())
    }

    /// Create a new service decoding imports with `registry`.
    pub fn with_registry(repo: R, registry: &'static Registry) -> Self {
        Self { repo, registry }
    }

    /// Create a new rule after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub async fn create_rule(&self, rule: Rule) -> Result<Rule, LoopRuleError> {
        rule.validate()?;
        self.repo.create(rule).await
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::NotFound`] when no rule with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<Rule, LoopRuleError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, LoopRuleError> {
        self.repo.get_all().await
    }

    /// Update an existing rule. `last_fired` is kept from the stored rule.
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::Validation`] if invariants fail,
    /// [`LoopRuleError::NotFound`] if the rule does not exist, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn update_rule(&self, mut rule: Rule) -> Result<Rule, LoopRuleError> {
        rule.validate()?;
        let existing = self.get_rule(rule.id).await?;
        rule.last_fired = existing.last_fired;
        self.repo.update(rule).await
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), LoopRuleError> {
        self.repo.delete(id).await
    }

    /// Export every rule as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn export_rules(&self) -> Result<String, LoopRuleError> {
        let rules = self.repo.get_all().await?;
        Ok(encode_rule_set(&rules))
    }

    /// Import a JSON array of rules. Entries whose id already exists replace
    /// the stored rule but keep its `last_fired`; others are created. Unknown
    /// variants are dropped node by node, and rules that end up invalid are
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`LoopRuleError::Validation`] if the document is not a JSON
    /// array, or a storage error from the repository.
    #[tracing::instrument(skip(self, text))]
    pub async fn import_rules(&self, text: &str) -> Result<ImportSummary, LoopRuleError> {
        let rules = decode_rule_set(self.registry, text)?;
        let mut summary = ImportSummary::default();
        for mut rule in rules {
            if let Err(err) = rule.validate() {
                tracing::warn!(rule = %rule.name, error = %err, "imported rule is not valid");
                summary.invalid += 1;
            }
            if let Some(existing) = self.repo.get_by_id(rule.id).await? {
                rule.last_fired = existing.last_fired;
                self.repo.update(rule).await?;
                summary.updated += 1;
            } else {
                self.repo.create(rule).await?;
                summary.created += 1;
            }
        }
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            invalid = summary.invalid,
            "rules imported"
        );
        Ok(summary)
    }
}
