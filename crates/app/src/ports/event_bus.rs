//! Event bus port: publish/subscribe for engine events.

use std::future::Future;

use looprule_domain::error::LoopRuleError;
use looprule_domain::event::Event;

/// Publishes engine events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LoopRuleError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LoopRuleError>> + Send {
        (**self).publish(event)
    }
}
