//! Single-use completion handle binding one action run to one [`Outcome`].
//!
//! [`channel`] returns the [`Callback`] handed to whoever performs the work
//! and the [`Completion`] the caller awaits. Completing consumes the
//! callback, so it cannot be completed twice. Dropping it uncompleted sends
//! a failure, so the caller always receives exactly one outcome.

use tokio::sync::oneshot;

use looprule_domain::command::Outcome;

const DROPPED: &str = "callback dropped without an outcome";

/// Sending half. Complete it once with [`Callback::complete`],
/// [`Callback::succeed`] or [`Callback::fail`].
#[derive(Debug)]
pub struct Callback {
    sender: Option<oneshot::Sender<Outcome>>,
}

/// Receiving half.
#[derive(Debug)]
pub struct Completion {
    receiver: oneshot::Receiver<Outcome>,
}

/// Create a linked callback/completion pair.
#[must_use]
pub fn channel() -> (Callback, Completion) {
    let (sender, receiver) = oneshot::channel();
    (
        Callback {
            sender: Some(sender),
        },
        Completion { receiver },
    )
}

impl Callback {
    /// Deliver the outcome. A caller that stopped waiting is ignored.
    pub fn complete(mut self, outcome: Outcome) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(outcome);
        }
    }

    pub fn succeed(self, comment: impl Into<String>) {
        self.complete(Outcome::success(comment));
    }

    pub fn fail(self, comment: impl Into<String>) {
        self.complete(Outcome::failure(comment));
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            tracing::warn!("{DROPPED}");
            let _ = sender.send(Outcome::failure(DROPPED));
        }
    }
}

impl Completion {
    /// Wait for the outcome.
    ///
    /// There is no timeout: if the holder of the callback neither completes
    /// nor drops it, this never returns.
    pub async fn wait(self) -> Outcome {
        self.receiver
            .await
            .unwrap_or_else(|_| Outcome::failure(DROPPED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_deliver_success() {
        let (callback, completion) = channel();
        callback.succeed("done");
        assert_eq!(completion.wait().await, Outcome::success("done"));
    }

    #[tokio::test]
    async fn should_deliver_failure() {
        let (callback, completion) = channel();
        callback.fail("pump busy");
        let outcome = completion.wait().await;
        assert!(!outcome.success);
        assert_eq!(outcome.comment, "pump busy");
    }

    #[tokio::test]
    async fn should_report_failure_when_dropped_uncompleted() {
        let (callback, completion) = channel();
        drop(callback);
        let outcome = completion.wait().await;
        assert!(!outcome.success);
        assert_eq!(outcome.comment, DROPPED);
    }

    #[tokio::test]
    async fn should_deliver_outcome_completed_from_another_task() {
        let (callback, completion) = channel();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            callback.succeed("later");
        });
        assert_eq!(completion.wait().await, Outcome::success("later"));
    }

    #[test]
    fn should_ignore_caller_that_stopped_waiting() {
        let (callback, completion) = channel();
        drop(completion);
        callback.succeed("nobody listens");
    }
}
