//! Notifier that writes alarms and notifications to the log.

use looprule_app::ports::Notifier;
use looprule_domain::error::LoopRuleError;

/// Logs every message instead of showing it to a user.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn alarm(&self, text: String) -> Result<(), LoopRuleError> {
        tracing::warn!(%text, "ALARM");
        Ok(())
    }

    async fn notify(&self, text: String) -> Result<(), LoopRuleError> {
        tracing::info!(%text, "notification");
        Ok(())
    }
}
