//! Registry: kind tag to default constructor, for every trigger and action
//! variant this build knows.
//!
//! Decoding goes through a registry so persisted trees that mention variants
//! this build lacks (written by a newer version, say) lose only the unknown
//! nodes.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::Value;

use super::action::Action;
use super::record::Record;
use super::trigger::{Comparison, Flag, FlagCheck, Input, Trigger};

type TriggerCtor = fn() -> Trigger;
type ActionCtor = fn() -> Action;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Read-only table of variant constructors.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    triggers: BTreeMap<&'static str, TriggerCtor>,
    actions: BTreeMap<&'static str, ActionCtor>,
}

impl Registry {
    /// Process-wide registry holding every built-in variant, created on
    /// first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::builtin)
    }

    /// Start an empty registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with every built-in variant.
    #[must_use]
    pub fn builtin() -> Self {
        Self::builder()
            .trigger(Input::ProfilePercentage.kind(), || {
                Trigger::Compare(Comparison::default_for(Input::ProfilePercentage))
            })
            .trigger(Input::Glucose.kind(), || {
                Trigger::Compare(Comparison::default_for(Input::Glucose))
            })
            .trigger(Input::PumpLastConnection.kind(), || {
                Trigger::Compare(Comparison::default_for(Input::PumpLastConnection))
            })
            .trigger(Input::LoopSuspendedMinutes.kind(), || {
                Trigger::Compare(Comparison::default_for(Input::LoopSuspendedMinutes))
            })
            .trigger(Flag::LoopSuspended.kind(), || {
                Trigger::Flag(FlagCheck {
                    flag: Flag::LoopSuspended,
                    expected: true,
                })
            })
            .trigger(Flag::PumpConnected.kind(), || {
                Trigger::Flag(FlagCheck {
                    flag: Flag::PumpConnected,
                    expected: true,
                })
            })
            .trigger("and", || Trigger::And(Vec::new()))
            .trigger("or", || Trigger::Or(Vec::new()))
            .trigger("not", || Trigger::Not(None))
            .action("profile_switch_percent", || {
                Action::ProfileSwitchPercent(super::action::ProfileSwitchPercent::default())
            })
            .action("loop_suspend", || {
                Action::LoopSuspend(super::action::LoopSuspend::default())
            })
            .action("loop_resume", || Action::LoopResume)
            .action("alarm", || Action::alarm(""))
            .action("notification", || Action::notification(""))
            .action("temp_target", || {
                Action::TempTarget(super::action::TempTarget::default())
            })
            .action("stop_temp_target", || Action::StopTempTarget)
            .build()
    }

    /// Default trigger for a kind tag.
    #[must_use]
    pub fn new_trigger(&self, kind: &str) -> Option<Trigger> {
        self.triggers.get(kind).map(|ctor| ctor())
    }

    /// Default action for a kind tag.
    #[must_use]
    pub fn new_action(&self, kind: &str) -> Option<Action> {
        self.actions.get(kind).map(|ctor| ctor())
    }

    /// Known trigger tags, sorted.
    pub fn trigger_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.triggers.keys().copied()
    }

    /// Known action tags, sorted.
    pub fn action_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }

    /// Decode one trigger record. `None` when the value is not a record or
    /// its kind is unknown; the caller drops the node.
    #[must_use]
    pub fn decode_trigger(&self, value: &Value) -> Option<Trigger> {
        let Some(record) = Record::from_value(value) else {
            tracing::warn!(%value, "dropping trigger: not a tagged record");
            return None;
        };
        let Some(mut trigger) = self.new_trigger(&record.kind) else {
            tracing::warn!(kind = %record.kind, "dropping trigger: unknown kind");
            return None;
        };
        trigger.apply_data(&record.data, self);
        Some(trigger)
    }

    /// Decode one action record. `None` when the value is not a record or
    /// its kind is unknown; the caller drops the node.
    #[must_use]
    pub fn decode_action(&self, value: &Value) -> Option<Action> {
        let Some(record) = Record::from_value(value) else {
            tracing::warn!(%value, "dropping action: not a tagged record");
            return None;
        };
        let Some(mut action) = self.new_action(&record.kind) else {
            tracing::warn!(kind = %record.kind, "dropping action: unknown kind");
            return None;
        };
        action.apply_data(&record.data);
        Some(action)
    }

    /// Decode an action list, dropping unknown entries and keeping order.
    #[must_use]
    pub fn decode_actions(&self, values: &[Value]) -> Vec<Action> {
        values
            .iter()
            .filter_map(|value| self.decode_action(value))
            .collect()
    }
}

/// Collects constructors for a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    inner: Registry,
}

impl RegistryBuilder {
    #[must_use]
    pub fn trigger(mut self, kind: &'static str, ctor: TriggerCtor) -> Self {
        self.inner.triggers.insert(kind, ctor);
        self
    }

    #[must_use]
    pub fn action(mut self, kind: &'static str, ctor: ActionCtor) -> Self {
        self.inner.actions.insert(kind, ctor);
        self
    }

    #[must_use]
    pub fn build(self) -> Registry {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::comparator::Comparator;
    use serde_json::json;

    #[test]
    fn should_register_every_builtin_action() {
        let registry = Registry::builtin();
        let mut kinds: Vec<_> = registry.action_kinds().collect();
        let mut expected = Action::KINDS.to_vec();
        kinds.sort_unstable();
        expected.sort_unstable();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn should_register_every_builtin_trigger() {
        let registry = Registry::builtin();
        for input in Input::ALL {
            assert!(registry.new_trigger(input.kind()).is_some());
        }
        for flag in Flag::ALL {
            assert!(registry.new_trigger(flag.kind()).is_some());
        }
        for kind in ["and", "or", "not"] {
            assert!(registry.new_trigger(kind).is_some());
        }
    }

    #[test]
    fn should_construct_defaults_matching_their_tag() {
        let registry = Registry::global();
        for kind in registry.action_kinds() {
            assert_eq!(registry.new_action(kind).unwrap().kind(), kind);
        }
        for kind in registry.trigger_kinds() {
            assert_eq!(registry.new_trigger(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn should_share_one_global_instance() {
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }

    #[test]
    fn should_drop_unknown_action_and_keep_the_rest() {
        let values = vec![
            json!({"type": "loop_suspend", "data": {"durationInMinutes": 45}}),
            json!({"type": "carbs_request", "data": {"grams": 20}}),
            json!({"type": "alarm", "data": {"text": "Asd"}}),
        ];
        let actions = Registry::global().decode_actions(&values);
        assert_eq!(
            actions,
            vec![Action::loop_suspend(45), Action::alarm("Asd")]
        );
    }

    #[test]
    fn should_drop_action_that_is_not_a_record() {
        let values = vec![json!(42), json!({"type": "loop_resume"})];
        assert_eq!(
            Registry::global().decode_actions(&values),
            vec![Action::LoopResume]
        );
    }

    #[test]
    fn should_decode_nested_trigger_tree() {
        let tree = Trigger::and(vec![
            Trigger::profile_percent(Comparator::IsEqual, 100),
            Trigger::not(Trigger::loop_suspended(true)),
            Trigger::or(vec![
                Trigger::glucose(Comparator::IsGreater, 180.0),
                Trigger::pump_last_connection(Comparator::IsGreaterOrEqual, 20),
            ]),
        ]);
        let value = tree.to_record().to_value();
        assert_eq!(Registry::global().decode_trigger(&value), Some(tree));
    }

    #[test]
    fn should_omit_unknown_child_of_and() {
        let value = json!({"type": "and", "data": {"triggers": [
            {"type": "profile_percent", "data": {"comparator": "IS_EQUAL", "percentage": 100}},
            {"type": "wifi_ssid", "data": {"ssid": "home"}},
        ]}});
        let decoded = Registry::global().decode_trigger(&value).unwrap();
        assert_eq!(
            decoded,
            Trigger::and(vec![Trigger::profile_percent(Comparator::IsEqual, 100)])
        );
        assert!(decoded.is_valid());
    }

    #[test]
    fn should_leave_not_empty_and_invalid_when_child_is_unknown() {
        let value = json!({"type": "not", "data": {"trigger": {"type": "location"}}});
        let decoded = Registry::global().decode_trigger(&value).unwrap();
        assert_eq!(decoded, Trigger::Not(None));
        assert!(!decoded.is_valid());
    }

    #[test]
    fn should_behave_like_an_older_build_with_a_partial_registry() {
        let older = Registry::builder()
            .action("alarm", || Action::alarm(""))
            .build();
        let values = vec![
            Action::alarm("one").to_record().to_value(),
            Action::temp_target(100.0, 30).to_record().to_value(),
            Action::alarm("two").to_record().to_value(),
        ];
        assert_eq!(
            older.decode_actions(&values),
            vec![Action::alarm("one"), Action::alarm("two")]
        );
    }
}
