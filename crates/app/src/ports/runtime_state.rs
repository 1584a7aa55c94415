//! Runtime state port: read-only view of current therapy state.

use std::future::Future;

use looprule_domain::error::LoopRuleError;
use looprule_domain::snapshot::RuntimeSnapshot;

/// Source of [`RuntimeSnapshot`]s, taken once per evaluation and again
/// before each action.
pub trait RuntimeState {
    /// Capture the current state.
    fn snapshot(&self) -> impl Future<Output = Result<RuntimeSnapshot, LoopRuleError>> + Send;
}

impl<T: RuntimeState + Send + Sync> RuntimeState for std::sync::Arc<T> {
    fn snapshot(&self) -> impl Future<Output = Result<RuntimeSnapshot, LoopRuleError>> + Send {
        (**self).snapshot()
    }
}
