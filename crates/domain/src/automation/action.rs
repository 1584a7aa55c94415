//! Action: therapy operation a rule requests when its trigger fires.
//!
//! Each variant owns its parameter fields, declares their domains and knows
//! its own precondition. Domains differ per variant: a zero duration means
//! "indefinite" for a profile switch but is invalid for a loop suspension or
//! a temp target.

use serde_json::{Value, json};

use super::comparator::Comparator;
use super::record::{Record, read_f64, read_i64, read_string};
use super::trigger::Trigger;
use crate::command::Command;

/// Switch to the active profile scaled by a percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSwitchPercent {
    pub percentage: i32,
    /// 0 means indefinitely.
    pub duration_minutes: i64,
}

impl ProfileSwitchPercent {
    pub const MIN_PERCENTAGE: i32 = 10;
    pub const MAX_PERCENTAGE: i32 = 200;

    #[must_use]
    pub fn new(percentage: i32, duration_minutes: i64) -> Self {
        Self {
            percentage,
            duration_minutes,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (Self::MIN_PERCENTAGE..=Self::MAX_PERCENTAGE).contains(&self.percentage)
            && self.duration_minutes >= 0
    }
}

impl Default for ProfileSwitchPercent {
    fn default() -> Self {
        Self::new(100, 30)
    }
}

/// Suspend the closed loop for a number of minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSuspend {
    pub duration_minutes: i64,
}

impl LoopSuspend {
    #[must_use]
    pub fn new(duration_minutes: i64) -> Self {
        Self { duration_minutes }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.duration_minutes > 0
    }
}

impl Default for LoopSuspend {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Start a temporary glucose target.
#[derive(Debug, Clone, PartialEq)]
pub struct TempTarget {
    pub target_mgdl: f64,
    pub duration_minutes: i64,
}

impl TempTarget {
    pub const MIN_TARGET_MGDL: f64 = 72.0;
    pub const MAX_TARGET_MGDL: f64 = 270.0;

    #[must_use]
    pub fn new(target_mgdl: f64, duration_minutes: i64) -> Self {
        Self {
            target_mgdl,
            duration_minutes,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (Self::MIN_TARGET_MGDL..=Self::MAX_TARGET_MGDL).contains(&self.target_mgdl)
            && self.duration_minutes > 0
    }
}

impl Default for TempTarget {
    fn default() -> Self {
        Self::new(140.0, 60)
    }
}

/// What executing an action amounts to, before any idempotence check.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Goes through the actuation queue.
    Actuate(Command),
    /// Raises an alarm on the user's device.
    Alarm(String),
    /// Posts a plain notification.
    Notify(String),
}

/// Operation requested by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ProfileSwitchPercent(ProfileSwitchPercent),
    LoopSuspend(LoopSuspend),
    LoopResume,
    Alarm { text: String },
    Notification { text: String },
    TempTarget(TempTarget),
    StopTempTarget,
}

impl Action {
    /// Every kind tag, in declaration order.
    pub const KINDS: [&'static str; 7] = [
        "profile_switch_percent",
        "loop_suspend",
        "loop_resume",
        "alarm",
        "notification",
        "temp_target",
        "stop_temp_target",
    ];

    #[must_use]
    pub fn profile_switch(percentage: i32, duration_minutes: i64) -> Self {
        Self::ProfileSwitchPercent(ProfileSwitchPercent::new(percentage, duration_minutes))
    }

    #[must_use]
    pub fn loop_suspend(duration_minutes: i64) -> Self {
        Self::LoopSuspend(LoopSuspend::new(duration_minutes))
    }

    #[must_use]
    pub fn alarm(text: impl Into<String>) -> Self {
        Self::Alarm { text: text.into() }
    }

    #[must_use]
    pub fn notification(text: impl Into<String>) -> Self {
        Self::Notification { text: text.into() }
    }

    #[must_use]
    pub fn temp_target(target_mgdl: f64, duration_minutes: i64) -> Self {
        Self::TempTarget(TempTarget::new(target_mgdl, duration_minutes))
    }

    /// Stable kind tag used in records.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProfileSwitchPercent(_) => "profile_switch_percent",
            Self::LoopSuspend(_) => "loop_suspend",
            Self::LoopResume => "loop_resume",
            Self::Alarm { .. } => "alarm",
            Self::Notification { .. } => "notification",
            Self::TempTarget(_) => "temp_target",
            Self::StopTempTarget => "stop_temp_target",
        }
    }

    /// Trigger that must hold right before the action runs.
    ///
    /// A profile switch only applies on top of an unmodified (100 %)
    /// profile. Other variants have none.
    #[must_use]
    pub fn precondition(&self) -> Option<Trigger> {
        match self {
            Self::ProfileSwitchPercent(_) => {
                Some(Trigger::profile_percent(Comparator::IsEqual, 100))
            }
            _ => None,
        }
    }

    /// Every field is in its domain and the precondition, if any, is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let fields = match self {
            Self::ProfileSwitchPercent(p) => p.is_valid(),
            Self::LoopSuspend(s) => s.is_valid(),
            Self::TempTarget(t) => t.is_valid(),
            Self::LoopResume
            | Self::Alarm { .. }
            | Self::Notification { .. }
            | Self::StopTempTarget => true,
        };
        fields && self.precondition().is_none_or(|p| p.is_valid())
    }

    /// One-line summary of the current field values.
    #[must_use]
    pub fn short_description(&self) -> String {
        match self {
            Self::ProfileSwitchPercent(p) if p.duration_minutes == 0 => {
                format!("Start profile {}%", p.percentage)
            }
            Self::ProfileSwitchPercent(p) => {
                format!("Start profile {}% for {} min", p.percentage, p.duration_minutes)
            }
            Self::LoopSuspend(s) => format!("Suspend loop for {} min", s.duration_minutes),
            Self::LoopResume => "Resume loop".to_string(),
            Self::Alarm { text } => format!("Alarm: {text}"),
            Self::Notification { text } => format!("Notification: {text}"),
            Self::TempTarget(t) => format!(
                "Temp target {} mg/dL for {} min",
                t.target_mgdl, t.duration_minutes
            ),
            Self::StopTempTarget => "Stop temp target".to_string(),
        }
    }

    /// What running this action asks of the outside world.
    #[must_use]
    pub fn effect(&self) -> Effect {
        match self {
            Self::ProfileSwitchPercent(p) => Effect::Actuate(Command::ProfileSwitch {
                percentage: p.percentage,
                duration_minutes: p.duration_minutes,
            }),
            Self::LoopSuspend(s) => Effect::Actuate(Command::SuspendLoop {
                duration_minutes: s.duration_minutes,
            }),
            Self::LoopResume => Effect::Actuate(Command::ResumeLoop),
            Self::Alarm { text } => Effect::Alarm(text.clone()),
            Self::Notification { text } => Effect::Notify(text.clone()),
            Self::TempTarget(t) => Effect::Actuate(Command::StartTempTarget {
                target_mgdl: t.target_mgdl,
                duration_minutes: t.duration_minutes,
            }),
            Self::StopTempTarget => Effect::Actuate(Command::CancelTempTarget),
        }
    }

    /// Variant fields as the record's `data` object.
    #[must_use]
    pub fn data(&self) -> Value {
        match self {
            Self::ProfileSwitchPercent(p) => json!({
                "percentage": p.percentage,
                "durationInMinutes": p.duration_minutes,
            }),
            Self::LoopSuspend(s) => json!({ "durationInMinutes": s.duration_minutes }),
            Self::Alarm { text } | Self::Notification { text } => json!({ "text": text }),
            Self::TempTarget(t) => json!({
                "targetMgdl": t.target_mgdl,
                "durationInMinutes": t.duration_minutes,
            }),
            Self::LoopResume | Self::StopTempTarget => json!({}),
        }
    }

    /// Encode as a tagged record.
    #[must_use]
    pub fn to_record(&self) -> Record {
        Record::new(self.kind(), self.data())
    }

    /// Encode as `{"type": …, "data": {…}}` text.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_record().to_value().to_string()
    }

    /// Overwrite fields from a record's inner `data` object. Fields that are
    /// missing or malformed keep their current value.
    pub fn apply_data(&mut self, data: &Value) {
        match self {
            Self::ProfileSwitchPercent(p) => {
                if let Some(percentage) =
                    read_i64(data, "percentage").and_then(|v| i32::try_from(v).ok())
                {
                    p.percentage = percentage;
                }
                if let Some(duration) = read_i64(data, "durationInMinutes") {
                    p.duration_minutes = duration;
                }
            }
            Self::LoopSuspend(s) => {
                if let Some(duration) = read_i64(data, "durationInMinutes") {
                    s.duration_minutes = duration;
                }
            }
            Self::Alarm { text } | Self::Notification { text } => {
                if let Some(value) = read_string(data, "text") {
                    *text = value;
                }
            }
            Self::TempTarget(t) => {
                if let Some(target) = read_f64(data, "targetMgdl") {
                    t.target_mgdl = target;
                }
                if let Some(duration) = read_i64(data, "durationInMinutes") {
                    t.duration_minutes = duration;
                }
            }
            Self::LoopResume | Self::StopTempTarget => {}
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short_description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::registry::Registry;

    fn round_trip(action: &Action) -> Action {
        let value: Value = serde_json::from_str(&action.to_json()).unwrap();
        assert_eq!(value["type"], action.kind());
        let mut decoded = Registry::global().new_action(action.kind()).unwrap();
        decoded.apply_data(&value["data"]);
        decoded
    }

    #[test]
    fn should_round_trip_every_variant() {
        let actions = [
            Action::profile_switch(150, 45),
            Action::profile_switch(80, 0),
            Action::loop_suspend(90),
            Action::LoopResume,
            Action::alarm("Asd"),
            Action::notification("low soon"),
            Action::temp_target(110.5, 120),
            Action::StopTempTarget,
        ];
        for action in &actions {
            assert_eq!(&round_trip(action), action);
        }
    }

    #[test]
    fn should_encode_alarm_text_under_data() {
        let value: Value = serde_json::from_str(&Action::alarm("Asd").to_json()).unwrap();
        assert_eq!(value, json!({"type": "alarm", "data": {"text": "Asd"}}));
    }

    #[test]
    fn should_encode_profile_switch_as_integers() {
        let data = Action::profile_switch(150, 30).data();
        assert_eq!(data, json!({"percentage": 150, "durationInMinutes": 30}));
    }

    #[test]
    fn should_accept_profile_switch_within_domain() {
        assert!(Action::profile_switch(150, 30).is_valid());
        assert!(Action::profile_switch(10, 30).is_valid());
        assert!(Action::profile_switch(200, 30).is_valid());
    }

    #[test]
    fn should_reject_profile_switch_outside_domain() {
        assert!(!Action::profile_switch(5, 30).is_valid());
        assert!(!Action::profile_switch(201, 30).is_valid());
        assert!(!Action::profile_switch(150, -1).is_valid());
    }

    #[test]
    fn should_accept_zero_duration_for_profile_switch() {
        let action = Action::profile_switch(150, 0);
        assert!(action.is_valid());
        assert_eq!(action.short_description(), "Start profile 150%");
    }

    #[test]
    fn should_reject_zero_duration_for_loop_suspend() {
        assert!(!Action::loop_suspend(0).is_valid());
        assert!(!Action::loop_suspend(-5).is_valid());
        assert!(Action::loop_suspend(1).is_valid());
    }

    #[test]
    fn should_validate_temp_target_domain() {
        assert!(Action::temp_target(140.0, 60).is_valid());
        assert!(!Action::temp_target(60.0, 60).is_valid());
        assert!(!Action::temp_target(300.0, 60).is_valid());
        assert!(!Action::temp_target(140.0, 0).is_valid());
    }

    #[test]
    fn should_require_unmodified_profile_before_profile_switch() {
        let precondition = Action::profile_switch(80, 30).precondition().unwrap();
        assert_eq!(
            precondition,
            Trigger::profile_percent(Comparator::IsEqual, 100)
        );
        assert!(precondition.is_valid());
    }

    #[test]
    fn should_have_no_precondition_for_other_variants() {
        assert!(Action::loop_suspend(30).precondition().is_none());
        assert!(Action::alarm("x").precondition().is_none());
        assert!(Action::temp_target(140.0, 60).precondition().is_none());
    }

    #[test]
    fn should_describe_current_field_values() {
        let mut action = Action::profile_switch(120, 30);
        assert_eq!(action.short_description(), "Start profile 120% for 30 min");
        action.apply_data(&json!({"percentage": 90}));
        assert_eq!(action.short_description(), "Start profile 90% for 30 min");
        assert_eq!(
            Action::loop_suspend(15).short_description(),
            "Suspend loop for 15 min"
        );
        assert_eq!(Action::alarm("Asd").short_description(), "Alarm: Asd");
    }

    #[test]
    fn should_fall_back_to_defaults_for_malformed_fields() {
        let mut action = Registry::global().new_action("profile_switch_percent").unwrap();
        action.apply_data(&json!({"percentage": "lots", "durationInMinutes": 12.5}));
        assert_eq!(action, Action::profile_switch(100, 30));

        let mut action = Registry::global().new_action("loop_suspend").unwrap();
        action.apply_data(&json!([]));
        assert_eq!(action, Action::loop_suspend(30));

        let mut action = Registry::global().new_action("alarm").unwrap();
        action.apply_data(&json!({"text": 7}));
        assert_eq!(action, Action::alarm(""));
    }

    #[test]
    fn should_keep_well_formed_fields_next_to_malformed_ones() {
        let mut action = Registry::global().new_action("temp_target").unwrap();
        action.apply_data(&json!({"targetMgdl": 100, "durationInMinutes": "soon"}));
        assert_eq!(action, Action::temp_target(100.0, 60));
    }

    #[test]
    fn should_map_variants_to_effects() {
        assert_eq!(
            Action::loop_suspend(30).effect(),
            Effect::Actuate(Command::SuspendLoop {
                duration_minutes: 30
            })
        );
        assert_eq!(
            Action::StopTempTarget.effect(),
            Effect::Actuate(Command::CancelTempTarget)
        );
        assert_eq!(Action::alarm("hi").effect(), Effect::Alarm("hi".to_string()));
    }
}
