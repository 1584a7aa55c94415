//! Notifier port: user-facing alarms and notifications.

use std::future::Future;

use looprule_domain::error::LoopRuleError;

/// Delivers messages to the user.
pub trait Notifier {
    /// Raise an alarm that demands attention.
    fn alarm(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send;

    /// Post a plain notification.
    fn notify(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send;
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn alarm(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        (**self).alarm(text)
    }

    fn notify(&self, text: String) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        (**self).notify(text)
    }
}
