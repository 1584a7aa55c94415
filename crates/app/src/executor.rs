//! Action executor: turns one [`Action`] into exactly one [`Outcome`].
//!
//! Structural problems (invalid fields, failing precondition) are reported
//! through the callback like any other failure. Loop suspend and resume are
//! idempotent: when the loop is already in the requested state no command
//! is issued and the action reports success.

use looprule_domain::automation::{Action, Effect};
use looprule_domain::command::{Command, Outcome};
use looprule_domain::error::LoopRuleError;
use looprule_domain::snapshot::RuntimeSnapshot;

use crate::callback::{self, Callback};
use crate::ports::{ActuationQueue, Notifier, RuntimeState};

/// Why an action may not run right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// A field is outside its domain.
    Invalid,
    /// The action's precondition does not hold.
    PreconditionFailed(String),
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => f.write_str("action is not valid"),
            Self::PreconditionFailed(trigger) => write!(f, "precondition not met: {trigger}"),
        }
    }
}

/// Check that `action` may run against `snapshot`.
///
/// # Errors
///
/// Returns the [`Refusal`] explaining why it may not.
pub fn preflight(action: &Action, snapshot: &RuntimeSnapshot) -> Result<(), Refusal> {
    if !action.is_valid() {
        return Err(Refusal::Invalid);
    }
    match action.precondition() {
        Some(precondition) if !precondition.evaluate(snapshot) => {
            Err(Refusal::PreconditionFailed(precondition.to_string()))
        }
        _ => Ok(()),
    }
}

/// Runs actions against the actuation queue and the notifier.
pub struct ActionExecutor<Q, S, N> {
    queue: Q,
    state: S,
    notifier: N,
}

impl<Q, S, N> ActionExecutor<Q, S, N>
where
    Q: ActuationQueue + Send + Sync,
    S: RuntimeState + Send + Sync,
    N: Notifier + Send + Sync,
{
    /// Create a new executor.
    pub fn new(queue: Q, state: S, notifier: N) -> Self {
        Self {
            queue,
            state,
            notifier,
        }
    }

    /// Capture the current runtime state.
    ///
    /// # Errors
    ///
    /// Propagates the error of the runtime state port.
    pub async fn snapshot(&self) -> Result<RuntimeSnapshot, LoopRuleError> {
        self.state.snapshot().await
    }

    /// Request the operation. `callback` is completed exactly once, possibly
    /// after this returns when the actuation queue answers later.
    pub async fn do_action(&self, action: &Action, callback: Callback) {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                callback.fail(format!("runtime state unavailable: {err}"));
                return;
            }
        };
        if let Err(refusal) = preflight(action, &snapshot) {
            callback.fail(refusal.to_string());
            return;
        }
        self.dispatch(action, &snapshot, callback).await;
    }

    /// Perform an action that already passed [`preflight`].
    pub async fn dispatch(&self, action: &Action, snapshot: &RuntimeSnapshot, callback: Callback) {
        match action.effect() {
            Effect::Actuate(Command::SuspendLoop { .. }) if snapshot.loop_suspended => {
                tracing::debug!("loop already suspended, nothing to do");
                callback.succeed("loop already suspended");
            }
            Effect::Actuate(Command::ResumeLoop) if !snapshot.loop_suspended => {
                tracing::debug!("loop already running, nothing to do");
                callback.succeed("loop already running");
            }
            Effect::Actuate(command) => {
                tracing::debug!(%command, "enqueueing command");
                self.queue.enqueue(command, callback);
            }
            Effect::Alarm(text) => match self.notifier.alarm(text.clone()).await {
                Ok(()) => callback.succeed(format!("alarm raised: {text}")),
                Err(err) => callback.fail(format!("alarm failed: {err}")),
            },
            Effect::Notify(text) => match self.notifier.notify(text.clone()).await {
                Ok(()) => callback.succeed(format!("notification posted: {text}")),
                Err(err) => callback.fail(format!("notification failed: {err}")),
            },
        }
    }

    /// Run an action and wait for its outcome.
    pub async fn run(&self, action: &Action) -> Outcome {
        let (callback, completion) = callback::channel();
        self.do_action(action, callback).await;
        completion.wait().await
    }
}
