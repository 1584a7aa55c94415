//! Actuation commands and their outcomes.
//!
//! A [`Command`] is what an action hands to the actuation queue; the queue
//! answers with exactly one [`Outcome`] per command.

use serde::{Deserialize, Serialize};

/// Request sent to the therapy actuation queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Switch to the active profile scaled by `percentage` for
    /// `duration_minutes` (0 = indefinitely).
    ProfileSwitch {
        percentage: i32,
        duration_minutes: i64,
    },
    /// Suspend the closed loop.
    SuspendLoop { duration_minutes: i64 },
    /// Resume a suspended loop.
    ResumeLoop,
    /// Start a temporary glucose target.
    StartTempTarget {
        target_mgdl: f64,
        duration_minutes: i64,
    },
    /// Cancel the running temporary target.
    CancelTempTarget,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfileSwitch {
                percentage,
                duration_minutes,
            } => write!(f, "profile_switch({percentage}%, {duration_minutes} min)"),
            Self::SuspendLoop { duration_minutes } => {
                write!(f, "suspend_loop({duration_minutes} min)")
            }
            Self::ResumeLoop => f.write_str("resume_loop"),
            Self::StartTempTarget {
                target_mgdl,
                duration_minutes,
            } => write!(
                f,
                "start_temp_target({target_mgdl} mg/dL, {duration_minutes} min)"
            ),
            Self::CancelTempTarget => f.write_str("cancel_temp_target"),
        }
    }
}

/// Result of one action or command: success flag plus a human-readable
/// comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub comment: String,
}

impl Outcome {
    #[must_use]
    pub fn success(comment: impl Into<String>) -> Self {
        Self {
            success: true,
            comment: comment.into(),
        }
    }

    #[must_use]
    pub fn failure(comment: impl Into<String>) -> Self {
        Self {
            success: false,
            comment: comment.into(),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "{status}: {}", self.comment)
    }
}
