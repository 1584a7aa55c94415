//! Simulated pump and loop state.
//!
//! All transitions take the current time explicitly so durations can be
//! exercised without waiting.

use chrono::TimeDelta;

use looprule_domain::command::{Command, Outcome};
use looprule_domain::snapshot::RuntimeSnapshot;
use looprule_domain::time::{Timestamp, minutes_between};

/// A running temporary target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTempTarget {
    pub target_mgdl: f64,
    pub until: Timestamp,
}

/// State of the simulated pump and loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpState {
    pub profile_percentage: i32,
    /// `None` while the switch is indefinite or no switch is active.
    pub profile_until: Option<Timestamp>,
    pub suspended_since: Option<Timestamp>,
    pub suspended_until: Option<Timestamp>,
    pub temp_target: Option<ActiveTempTarget>,
    pub pump_connected: bool,
    pub last_connection: Timestamp,
    pub glucose_mgdl: Option<f64>,
}

impl PumpState {
    /// A connected pump on the base profile with the loop running.
    #[must_use]
    pub fn new(at: Timestamp) -> Self {
        Self {
            profile_percentage: 100,
            profile_until: None,
            suspended_since: None,
            suspended_until: None,
            temp_target: None,
            pump_connected: true,
            last_connection: at,
            glucose_mgdl: None,
        }
    }

    /// Drop every timed state that ended at or before `at`.
    pub fn expire(&mut self, at: Timestamp) {
        if self.profile_until.is_some_and(|until| until <= at) {
            tracing::debug!("profile switch ended");
            self.profile_percentage = 100;
            self.profile_until = None;
        }
        if self.suspended_until.is_some_and(|until| until <= at) {
            tracing::debug!("loop suspension ended");
            self.suspended_since = None;
            self.suspended_until = None;
        }
        if self.temp_target.is_some_and(|tt| tt.until <= at) {
            tracing::debug!("temp target ended");
            self.temp_target = None;
        }
    }

    /// Carry out `command` at `at`.
    pub fn apply(&mut self, command: &Command, at: Timestamp) -> Outcome {
        self.expire(at);
        if !self.pump_connected {
            return Outcome::failure(format!("{command}: pump not connected"));
        }
        self.last_connection = at;

        match *command {
            Command::ProfileSwitch {
                percentage,
                duration_minutes,
            } => {
                let until = if duration_minutes > 0 {
                    match ends_at(at, duration_minutes) {
                        Some(until) => Some(until),
                        None => return out_of_range(command),
                    }
                } else {
                    None
                };
                self.profile_percentage = percentage;
                self.profile_until = until;
                Outcome::success(format!("profile switched to {percentage}%"))
            }
            Command::SuspendLoop { duration_minutes } => {
                let Some(until) = ends_at(at, duration_minutes) else {
                    return out_of_range(command);
                };
                self.suspended_since = Some(at);
                self.suspended_until = Some(until);
                Outcome::success(format!("loop suspended for {duration_minutes} min"))
            }
            Command::ResumeLoop => {
                self.suspended_since = None;
                self.suspended_until = None;
                Outcome::success("loop resumed")
            }
            Command::StartTempTarget {
                target_mgdl,
                duration_minutes,
            } => {
                let Some(until) = ends_at(at, duration_minutes) else {
                    return out_of_range(command);
                };
                self.temp_target = Some(ActiveTempTarget { target_mgdl, until });
                Outcome::success(format!(
                    "temp target {target_mgdl} mg/dL for {duration_minutes} min"
                ))
            }
            Command::CancelTempTarget => match self.temp_target.take() {
                Some(_) => Outcome::success("temp target cancelled"),
                None => Outcome::success("no temp target running"),
            },
        }
    }

    /// What the loop looks like at `at`.
    pub fn snapshot(&mut self, at: Timestamp) -> RuntimeSnapshot {
        self.expire(at);
        if self.pump_connected {
            self.last_connection = at;
        }
        RuntimeSnapshot {
            profile_percentage: self.profile_percentage,
            loop_suspended: self.suspended_since.is_some(),
            loop_suspended_minutes: self.suspended_since.map(|since| minutes_between(since, at)),
            pump_last_connection_minutes: Some(minutes_between(self.last_connection, at)),
            pump_connected: self.pump_connected,
            glucose_mgdl: self.glucose_mgdl,
            taken_at: at,
        }
    }
}

/// End of a timed state, or `None` when it is past the representable range.
fn ends_at(at: Timestamp, duration_minutes: i64) -> Option<Timestamp> {
    TimeDelta::try_minutes(duration_minutes).and_then(|delta| at.checked_add_signed(delta))
}

fn out_of_range(command: &Command) -> Outcome {
    tracing::warn!(%command, "duration out of range");
    Outcome::failure(format!("{command}: duration out of range"))
}
