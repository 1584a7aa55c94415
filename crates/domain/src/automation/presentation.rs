//! Display metadata for rule editors. Nothing here is evaluated by the
//! engine.

use super::action::Action;
use super::trigger::{Flag, Input, Trigger};

/// Name and icon shown to users for a variant.
pub trait Presentation {
    /// Human-readable variant name.
    fn friendly_name(&self) -> &'static str;

    /// Icon identifier (Material Symbols name).
    fn icon(&self) -> &'static str;
}

impl Presentation for Action {
    fn friendly_name(&self) -> &'static str {
        match self {
            Self::ProfileSwitchPercent(_) => "Profile percentage",
            Self::LoopSuspend(_) => "Suspend loop",
            Self::LoopResume => "Resume loop",
            Self::Alarm { .. } => "Alarm",
            Self::Notification { .. } => "Notification",
            Self::TempTarget(_) => "Start temp target",
            Self::StopTempTarget => "Stop temp target",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::ProfileSwitchPercent(_) => "switch_account",
            Self::LoopSuspend(_) => "pause_circle",
            Self::LoopResume => "play_circle",
            Self::Alarm { .. } => "alarm",
            Self::Notification { .. } => "notifications",
            Self::TempTarget(_) => "adjust",
            Self::StopTempTarget => "cancel",
        }
    }
}

impl Presentation for Trigger {
    fn friendly_name(&self) -> &'static str {
        match self {
            Self::Compare(c) => match c.input {
                Input::ProfilePercentage => "Profile percentage",
                Input::Glucose => "Glucose",
                Input::PumpLastConnection => "Last pump connection",
                Input::LoopSuspendedMinutes => "Loop suspended for",
            },
            Self::Flag(f) => match f.flag {
                Flag::LoopSuspended => "Loop suspended",
                Flag::PumpConnected => "Pump connected",
            },
            Self::And(_) => "All of",
            Self::Or(_) => "Any of",
            Self::Not(_) => "Not",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::Compare(c) => match c.input {
                Input::ProfilePercentage => "switch_account",
                Input::Glucose => "bloodtype",
                Input::PumpLastConnection => "bluetooth_searching",
                Input::LoopSuspendedMinutes => "timer",
            },
            Self::Flag(f) => match f.flag {
                Flag::LoopSuspended => "pause_circle",
                Flag::PumpConnected => "bluetooth_connected",
            },
            Self::And(_) | Self::Or(_) | Self::Not(_) => "account_tree",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::registry::Registry;

    #[test]
    fn should_name_every_registered_variant() {
        let registry = Registry::builtin();
        for kind in registry.action_kinds() {
            let action = registry.new_action(kind).unwrap();
            assert!(!action.friendly_name().is_empty(), "{kind}");
            assert!(!action.icon().is_empty(), "{kind}");
        }
        for kind in registry.trigger_kinds() {
            let trigger = registry.new_trigger(kind).unwrap();
            assert!(!trigger.friendly_name().is_empty(), "{kind}");
            assert!(!trigger.icon().is_empty(), "{kind}");
        }
    }

    #[test]
    fn should_distinguish_leaf_names() {
        let registry = Registry::builtin();
        let glucose = registry.new_trigger("glucose").unwrap();
        let profile = registry.new_trigger("profile_percent").unwrap();
        assert_eq!(glucose.friendly_name(), "Glucose");
        assert_ne!(glucose.icon(), profile.icon());
    }
}
