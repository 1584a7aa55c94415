//! Rule codec: JSON form of triggers, actions, rules and rule sets.
//!
//! Two decoding paths exist. `serde` deserialization of a [`Trigger`] or an
//! [`Action`] is strict at the root (an unknown kind is an error, which is
//! what an editor submitting a rule wants). The rule-set functions here are
//! lenient at every level: unknown nodes are dropped and malformed fields
//! fall back to defaults, so a stored rule set always loads.

use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

use super::Rule;
use super::action::Action;
use super::record::{Record, read_bool, read_string};
use super::registry::Registry;
use super::trigger::Trigger;
use crate::error::ValidationError;
use crate::id::RuleId;

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Record::deserialize(deserializer)?;
        let registry = Registry::global();
        let mut trigger = registry
            .new_trigger(&record.kind)
            .ok_or_else(|| D::Error::custom(format!("unknown trigger kind `{}`", record.kind)))?;
        trigger.apply_data(&record.data, registry);
        Ok(trigger)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Record::deserialize(deserializer)?;
        let mut action = Registry::global()
            .new_action(&record.kind)
            .ok_or_else(|| D::Error::custom(format!("unknown action kind `{}`", record.kind)))?;
        action.apply_data(&record.data);
        Ok(action)
    }
}

/// Encode a rule as a rule-set entry.
#[must_use]
pub fn encode_rule(rule: &Rule) -> Value {
    let actions: Vec<Value> = rule
        .actions
        .iter()
        .map(|action| action.to_record().to_value())
        .collect();
    json!({
        "id": rule.id,
        "name": rule.name,
        "enabled": rule.enabled,
        "trigger": rule.trigger.to_record().to_value(),
        "actions": actions,
    })
}

/// Decode one rule-set entry. `None` when the value is not an object.
///
/// A missing or unparsable `id` gets a fresh one, a missing `enabled` means
/// enabled, and an unknown or missing trigger becomes an empty `And` so the
/// rule stays visible to the editor but never fires.
#[must_use]
pub fn decode_rule(registry: &Registry, value: &Value) -> Option<Rule> {
    if !value.is_object() {
        tracing::warn!(%value, "dropping rule: not an object");
        return None;
    }
    let id = read_string(value, "id")
        .and_then(|s| RuleId::from_str(&s).ok())
        .unwrap_or_default();
    let trigger = value
        .get("trigger")
        .and_then(|t| registry.decode_trigger(t))
        .unwrap_or_else(|| Trigger::And(Vec::new()));
    let actions = value
        .get("actions")
        .and_then(Value::as_array)
        .map(|items| registry.decode_actions(items))
        .unwrap_or_default();
    Some(Rule {
        id,
        name: read_string(value, "name").unwrap_or_default(),
        enabled: read_bool(value, "enabled").unwrap_or(true),
        trigger,
        actions,
        last_fired: None,
    })
}

/// Encode rules as a pretty-printed JSON array.
#[must_use]
pub fn encode_rule_set(rules: &[Rule]) -> String {
    let values: Vec<Value> = rules.iter().map(encode_rule).collect();
    serde_json::to_string_pretty(&values).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON array of rules.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedRuleSet`] only when the text is not
/// JSON or not an array. Individual entries never fail the whole set.
pub fn decode_rule_set(registry: &Registry, text: &str) -> Result<Vec<Rule>, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ValidationError::MalformedRuleSet(err.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ValidationError::MalformedRuleSet(
            "expected a JSON array of rules".to_string(),
        ));
    };
    Ok(items
        .iter()
        .filter_map(|item| decode_rule(registry, item))
        .collect())
}
