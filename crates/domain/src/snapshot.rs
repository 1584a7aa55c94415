//! Runtime snapshot: the read-only view of therapy state a trigger sees.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Therapy and device state captured at one evaluation instant.
///
/// Values are quantized the way triggers compare them: percentages are whole
/// percent, elapsed durations whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// Percentage of the active profile (100 = unmodified).
    pub profile_percentage: i32,
    /// Whether the closed loop is currently suspended.
    pub loop_suspended: bool,
    /// Minutes the loop has been suspended, `None` when running.
    pub loop_suspended_minutes: Option<i64>,
    /// Minutes since the pump last answered, `None` if it never did.
    pub pump_last_connection_minutes: Option<i64>,
    /// Whether the pump link is currently up.
    pub pump_connected: bool,
    /// Latest glucose reading in mg/dL, if any.
    pub glucose_mgdl: Option<f64>,
    /// When the snapshot was taken.
    pub taken_at: Timestamp,
}

impl Default for RuntimeSnapshot {
    fn default() -> Self {
        Self {
            profile_percentage: 100,
            loop_suspended: false,
            loop_suspended_minutes: None,
            pump_last_connection_minutes: Some(0),
            pump_connected: true,
            glucose_mgdl: None,
            taken_at: crate::time::now(),
        }
    }
}
