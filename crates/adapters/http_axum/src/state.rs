//! Shared application state for axum handlers.

use std::sync::Arc;

use looprule_app::ports::RuleRepository;
use looprule_app::services::rule_service::RuleService;
use looprule_domain::automation::Registry;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the repository type does not need to
/// be `Clone`; only the `Arc` is cloned.
pub struct AppState<R> {
    /// Rule CRUD and rule-set service.
    pub rule_service: Arc<RuleService<R>>,
    /// Variants offered to rule editors.
    pub registry: &'static Registry,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            rule_service: Arc::clone(&self.rule_service),
            registry: self.registry,
        }
    }
}

impl<R> AppState<R>
where
    R: RuleRepository + Send + Sync + 'static,
{
    /// Create a new application state around a rule service, listing the
    /// process-wide registry.
    pub fn new(rule_service: RuleService<R>) -> Self {
        Self::from_arc(Arc::new(rule_service))
    }

    /// Create a new application state from a pre-wrapped service.
    pub fn from_arc(rule_service: Arc<RuleService<R>>) -> Self {
        Self {
            rule_service,
            registry: Registry::global(),
        }
    }
}
