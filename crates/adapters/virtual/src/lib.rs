//! # looprule-adapter-virtual
//!
//! Virtual/demo loop that stands in for a real pump, CGM and user interface.
//!
//! ## Provided ports
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`VirtualLoop`] | `ActuationQueue` | Applies each command after a configurable latency, then completes the callback |
//! | [`VirtualLoop`] | `RuntimeState` | Reports profile, suspension, pump connectivity and the simulated glucose |
//! | [`LogNotifier`] | `Notifier` | Writes alarms and notifications to the log |
//!
//! ## Dependency rule
//!
//! Depends on `looprule-app` (port traits) and `looprule-domain` only.

mod cgm;
mod notifier;
mod pump;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use looprule_app::callback::Callback;
use looprule_app::ports::{ActuationQueue, RuntimeState};
use looprule_domain::command::{Command, Outcome};
use looprule_domain::error::LoopRuleError;
use looprule_domain::snapshot::RuntimeSnapshot;
use looprule_domain::time::{Timestamp, now};

pub use cgm::reading_at;
pub use notifier::LogNotifier;
pub use pump::{ActiveTempTarget, PumpState};

/// Simulated pump and loop. Clones share the same state.
#[derive(Clone)]
pub struct VirtualLoop {
    state: Arc<Mutex<PumpState>>,
    latency: Duration,
}

impl Default for VirtualLoop {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl VirtualLoop {
    /// Create a loop whose pump answers each command after `latency`.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(PumpState::new(now()))),
            latency,
        }
    }

    /// Copy of the current pump state.
    #[must_use]
    pub fn state(&self) -> PumpState {
        let mut state = self.lock_state();
        state.expire(now());
        state.clone()
    }

    /// Set the latest glucose reading.
    pub fn set_glucose(&self, mgdl: f64) {
        self.lock_state().glucose_mgdl = Some(mgdl);
    }

    /// Connect or disconnect the pump.
    pub fn set_pump_connected(&self, connected: bool) {
        let mut state = self.lock_state();
        if connected {
            state.last_connection = now();
        }
        state.pump_connected = connected;
    }

    /// Start feeding simulated glucose readings every `every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn_glucose_simulation(&self, every: Duration) -> JoinHandle<()> {
        let this = self.clone();
        let started: Timestamp = now();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                #[allow(clippy::cast_precision_loss)]
                let elapsed = (now() - started).num_seconds() as f64 / 60.0;
                let reading = reading_at(elapsed);
                tracing::debug!(glucose = reading, "simulated cgm reading");
                this.set_glucose(reading);
            }
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, PumpState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, command: &Command) -> Outcome {
        let outcome = self.lock_state().apply(command, now());
        if outcome.success {
            tracing::info!(%command, comment = %outcome.comment, "virtual pump accepted command");
        } else {
            tracing::warn!(%command, comment = %outcome.comment, "virtual pump rejected command");
        }
        outcome
    }
}

impl ActuationQueue for VirtualLoop {
    fn enqueue(&self, command: Command, callback: Callback) {
        let Ok(handle) = Handle::try_current() else {
            callback.fail(format!("{command}: no runtime to run the virtual pump"));
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            if !this.latency.is_zero() {
                tokio::time::sleep(this.latency).await;
            }
            callback.complete(this.apply(&command));
        });
    }
}

impl RuntimeState for VirtualLoop {
    async fn snapshot(&self) -> Result<RuntimeSnapshot, LoopRuleError> {
        Ok(self.lock_state().snapshot(now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use looprule_app::callback;
    use looprule_app::executor::ActionExecutor;
    use looprule_domain::automation::Action;

    async fn send(pump: &VirtualLoop, command: Command) -> Outcome {
        let (callback, completion) = callback::channel();
        pump.enqueue(command, callback);
        completion.wait().await
    }

    #[tokio::test]
    async fn should_apply_profile_switch() {
        let pump = VirtualLoop::default();
        let outcome = send(
            &pump,
            Command::ProfileSwitch {
                percentage: 80,
                duration_minutes: 30,
            },
        )
        .await;
        assert_eq!(outcome, Outcome::success("profile switched to 80%"));
        assert_eq!(pump.snapshot().await.unwrap().profile_percentage, 80);
    }

    #[tokio::test]
    async fn should_answer_after_latency() {
        let pump = VirtualLoop::new(Duration::from_millis(20));
        let started = std::time::Instant::now();
        let outcome = send(&pump, Command::SuspendLoop { duration_minutes: 30 }).await;
        assert!(outcome.success);
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(pump.snapshot().await.unwrap().loop_suspended);
    }

    #[tokio::test]
    async fn should_reject_commands_when_pump_disconnected() {
        let pump = VirtualLoop::default();
        pump.set_pump_connected(false);
        let outcome = send(&pump, Command::ResumeLoop).await;
        assert!(!outcome.success);

        let snapshot = pump.snapshot().await.unwrap();
        assert!(!snapshot.pump_connected);
    }

    #[tokio::test]
    async fn should_report_glucose_in_snapshot() {
        let pump = VirtualLoop::default();
        assert_eq!(pump.snapshot().await.unwrap().glucose_mgdl, None);
        pump.set_glucose(182.0);
        assert_eq!(pump.snapshot().await.unwrap().glucose_mgdl, Some(182.0));
    }

    #[tokio::test]
    async fn should_share_state_between_clones() {
        let pump = VirtualLoop::default();
        let other = pump.clone();
        send(
            &other,
            Command::StartTempTarget {
                target_mgdl: 150.0,
                duration_minutes: 45,
            },
        )
        .await;
        assert_eq!(pump.state().temp_target.map(|tt| tt.target_mgdl), Some(150.0));
    }

    #[tokio::test]
    async fn should_drive_executor_end_to_end() {
        let pump = VirtualLoop::default();
        let exec = ActionExecutor::new(pump.clone(), pump.clone(), LogNotifier);

        assert!(exec.run(&Action::loop_suspend(30)).await.success);
        assert!(pump.state().suspended_since.is_some());

        let again = exec.run(&Action::loop_suspend(30)).await;
        assert_eq!(again, Outcome::success("loop already suspended"));

        assert!(exec.run(&Action::LoopResume).await.success);
        assert!(pump.state().suspended_since.is_none());
    }

    #[test]
    fn should_fail_callback_outside_runtime() {
        let pump = VirtualLoop::default();
        let (callback, completion) = callback::channel();
        pump.enqueue(Command::ResumeLoop, callback);
        let outcome = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(completion.wait());
        assert!(!outcome.success);
        assert!(outcome.comment.contains("no runtime"));
    }

    #[tokio::test]
    async fn should_feed_simulated_glucose() {
        let pump = VirtualLoop::default();
        let task = pump.spawn_glucose_simulation(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        task.abort();
        assert_eq!(pump.snapshot().await.unwrap().glucose_mgdl, Some(140.0));
    }
}
