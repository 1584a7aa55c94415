//! Trigger: boolean condition tree evaluated against a [`RuntimeSnapshot`].
//!
//! Leaves either compare a runtime input against a threshold
//! ([`Comparison`]) or check a boolean flag ([`FlagCheck`]). Combinators
//! (`And`, `Or`, `Not`) nest arbitrarily. Evaluation is pure: the same tree
//! and snapshot always give the same answer.

use std::ops::RangeInclusive;

use serde_json::{Value, json};

use super::comparator::Comparator;
use super::record::{Record, read_bool, read_comparator, read_f64, read_i64};
use super::registry::Registry;
use crate::snapshot::RuntimeSnapshot;

/// Numeric runtime input a [`Comparison`] reads from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    /// Active profile percentage, whole percent.
    ProfilePercentage,
    /// Latest glucose reading, mg/dL.
    Glucose,
    /// Minutes since the pump last answered.
    PumpLastConnection,
    /// Minutes the loop has been suspended.
    LoopSuspendedMinutes,
}

impl Input {
    /// Every input, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::ProfilePercentage,
        Self::Glucose,
        Self::PumpLastConnection,
        Self::LoopSuspendedMinutes,
    ];

    /// Kind tag of the leaf reading this input.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::ProfilePercentage => "profile_percent",
            Self::Glucose => "glucose",
            Self::PumpLastConnection => "pump_last_connection",
            Self::LoopSuspendedMinutes => "loop_suspended_duration",
        }
    }

    /// Name of the threshold field inside the record's `data`.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::ProfilePercentage => "percentage",
            Self::Glucose => "bg",
            Self::PumpLastConnection => "minutesAgo",
            Self::LoopSuspendedMinutes => "minutes",
        }
    }

    /// Range a threshold must lie in.
    #[must_use]
    pub fn domain(self) -> RangeInclusive<f64> {
        match self {
            Self::ProfilePercentage => 10.0..=200.0,
            Self::Glucose => 39.0..=400.0,
            Self::PumpLastConnection | Self::LoopSuspendedMinutes => 0.0..=10_080.0,
        }
    }

    /// Whether thresholds are whole numbers (percent or minutes).
    #[must_use]
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::Glucose)
    }

    fn default_threshold(self) -> f64 {
        match self {
            Self::ProfilePercentage | Self::Glucose => 100.0,
            Self::PumpLastConnection | Self::LoopSuspendedMinutes => 30.0,
        }
    }

    fn default_comparator(self) -> Comparator {
        match self {
            Self::ProfilePercentage => Comparator::IsEqual,
            Self::Glucose => Comparator::IsGreater,
            Self::PumpLastConnection | Self::LoopSuspendedMinutes => Comparator::IsGreaterOrEqual,
        }
    }

    /// Read the current value; `None` when the snapshot has no such value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn measure(self, snapshot: &RuntimeSnapshot) -> Option<f64> {
        match self {
            Self::ProfilePercentage => Some(f64::from(snapshot.profile_percentage)),
            Self::Glucose => snapshot.glucose_mgdl,
            Self::PumpLastConnection => snapshot.pump_last_connection_minutes.map(|m| m as f64),
            Self::LoopSuspendedMinutes => snapshot.loop_suspended_minutes.map(|m| m as f64),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ProfilePercentage => "profile %",
            Self::Glucose => "glucose",
            Self::PumpLastConnection => "pump last connection",
            Self::LoopSuspendedMinutes => "loop suspended for",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::ProfilePercentage => "",
            Self::Glucose => " mg/dL",
            Self::PumpLastConnection | Self::LoopSuspendedMinutes => " min",
        }
    }
}

/// Leaf comparing a runtime input against a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub input: Input,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Comparison {
    #[must_use]
    pub fn new(input: Input, comparator: Comparator, threshold: f64) -> Self {
        Self {
            input,
            comparator,
            threshold,
        }
    }

    /// Default leaf for an input, as created by the registry.
    #[must_use]
    pub fn default_for(input: Input) -> Self {
        Self::new(input, input.default_comparator(), input.default_threshold())
    }

    /// Threshold is finite, within the input's domain and whole where the
    /// input is integral.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.threshold.is_finite()
            && self.input.domain().contains(&self.threshold)
            && (!self.input.is_integral() || self.threshold.fract() == 0.0)
    }

    /// `false` when the input is absent from the snapshot.
    #[must_use]
    pub fn evaluate(&self, snapshot: &RuntimeSnapshot) -> bool {
        self.input
            .measure(snapshot)
            .is_some_and(|measured| self.comparator.compare(measured, self.threshold))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn data(&self) -> Value {
        let threshold = if self.input.is_integral() && self.threshold.fract() == 0.0 {
            json!(self.threshold as i64)
        } else {
            json!(self.threshold)
        };
        json!({ "comparator": self.comparator, self.input.field(): threshold })
    }

    #[allow(clippy::cast_precision_loss)]
    fn apply_data(&mut self, data: &Value) {
        if let Some(comparator) = read_comparator(data, "comparator") {
            self.comparator = comparator;
        }
        let field = self.input.field();
        let threshold = if self.input.is_integral() {
            read_i64(data, field).map(|v| v as f64)
        } else {
            read_f64(data, field)
        };
        if let Some(threshold) = threshold {
            self.threshold = threshold;
        }
    }
}

/// Boolean runtime flag a [`FlagCheck`] reads from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    LoopSuspended,
    PumpConnected,
}

impl Flag {
    /// Every flag, in declaration order.
    pub const ALL: [Self; 2] = [Self::LoopSuspended, Self::PumpConnected];

    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::LoopSuspended => "loop_suspended",
            Self::PumpConnected => "pump_connected",
        }
    }

    #[must_use]
    pub fn read(self, snapshot: &RuntimeSnapshot) -> bool {
        match self {
            Self::LoopSuspended => snapshot.loop_suspended,
            Self::PumpConnected => snapshot.pump_connected,
        }
    }
}

/// Leaf checking that a flag has the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagCheck {
    pub flag: Flag,
    pub expected: bool,
}

impl FlagCheck {
    #[must_use]
    pub fn evaluate(&self, snapshot: &RuntimeSnapshot) -> bool {
        self.flag.read(snapshot) == self.expected
    }
}

/// Condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Numeric comparison leaf.
    Compare(Comparison),
    /// Boolean flag leaf.
    Flag(FlagCheck),
    /// True when every child is true. Must be non-empty.
    And(Vec<Trigger>),
    /// True when any child is true. Must be non-empty.
    Or(Vec<Trigger>),
    /// Negates its child. A missing child (dropped during decoding) makes the
    /// node invalid and `false`.
    Not(Option<Box<Trigger>>),
}

impl Trigger {
    /// `profile % <op> percentage`.
    #[must_use]
    pub fn profile_percent(comparator: Comparator, percentage: i32) -> Self {
        Self::Compare(Comparison::new(
            Input::ProfilePercentage,
            comparator,
            f64::from(percentage),
        ))
    }

    /// `glucose <op> mgdl`.
    #[must_use]
    pub fn glucose(comparator: Comparator, mgdl: f64) -> Self {
        Self::Compare(Comparison::new(Input::Glucose, comparator, mgdl))
    }

    /// `minutes since last pump connection <op> minutes`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pump_last_connection(comparator: Comparator, minutes: i64) -> Self {
        Self::Compare(Comparison::new(
            Input::PumpLastConnection,
            comparator,
            minutes as f64,
        ))
    }

    /// `minutes the loop has been suspended <op> minutes`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn loop_suspended_for(comparator: Comparator, minutes: i64) -> Self {
        Self::Compare(Comparison::new(
            Input::LoopSuspendedMinutes,
            comparator,
            minutes as f64,
        ))
    }

    /// Loop suspended flag equals `suspended`.
    #[must_use]
    pub fn loop_suspended(suspended: bool) -> Self {
        Self::Flag(FlagCheck {
            flag: Flag::LoopSuspended,
            expected: suspended,
        })
    }

    /// Pump connected flag equals `connected`.
    #[must_use]
    pub fn pump_connected(connected: bool) -> Self {
        Self::Flag(FlagCheck {
            flag: Flag::PumpConnected,
            expected: connected,
        })
    }

    #[must_use]
    pub fn and(children: Vec<Trigger>) -> Self {
        Self::And(children)
    }

    #[must_use]
    pub fn or(children: Vec<Trigger>) -> Self {
        Self::Or(children)
    }

    #[must_use]
    pub fn not(child: Trigger) -> Self {
        Self::Not(Some(Box::new(child)))
    }

    /// Stable kind tag used in records.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compare(c) => c.input.kind(),
            Self::Flag(f) => f.flag.kind(),
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Not(_) => "not",
        }
    }

    /// Evaluate against a snapshot. Never mutates anything.
    ///
    /// Empty combinators evaluate to `false`.
    #[must_use]
    pub fn evaluate(&self, snapshot: &RuntimeSnapshot) -> bool {
        match self {
            Self::Compare(c) => c.evaluate(snapshot),
            Self::Flag(f) => f.evaluate(snapshot),
            Self::And(children) => {
                !children.is_empty() && children.iter().all(|c| c.evaluate(snapshot))
            }
            Self::Or(children) => children.iter().any(|c| c.evaluate(snapshot)),
            Self::Not(child) => child.as_ref().is_some_and(|c| !c.evaluate(snapshot)),
        }
    }

    /// Every leaf operand is in-domain and every combinator is populated,
    /// recursively.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Compare(c) => c.is_valid(),
            Self::Flag(_) => true,
            Self::And(children) | Self::Or(children) => {
                !children.is_empty() && children.iter().all(Trigger::is_valid)
            }
            Self::Not(child) => child.as_ref().is_some_and(|c| c.is_valid()),
        }
    }

    /// Encode as a tagged record.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let data = match self {
            Self::Compare(c) => c.data(),
            Self::Flag(f) => json!({ "expected": f.expected }),
            Self::And(children) | Self::Or(children) => {
                let triggers: Vec<Value> = children.iter().map(|c| c.to_record().to_value()).collect();
                json!({ "triggers": triggers })
            }
            Self::Not(child) => match child {
                Some(c) => json!({ "trigger": c.to_record().to_value() }),
                None => json!({}),
            },
        };
        Record::new(self.kind(), data)
    }

    /// Overwrite fields from a record's `data`. Children are rebuilt through
    /// `registry`; children with unknown kinds are dropped.
    pub fn apply_data(&mut self, data: &Value, registry: &Registry) {
        match self {
            Self::Compare(c) => c.apply_data(data),
            Self::Flag(f) => {
                if let Some(expected) = read_bool(data, "expected") {
                    f.expected = expected;
                }
            }
            Self::And(children) | Self::Or(children) => {
                if let Some(items) = data.get("triggers").and_then(Value::as_array) {
                    *children = items
                        .iter()
                        .filter_map(|item| registry.decode_trigger(item))
                        .collect();
                }
            }
            Self::Not(child) => {
                if let Some(item) = data.get("trigger") {
                    *child = registry.decode_trigger(item).map(Box::new);
                }
            }
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compare(c) => write!(
                f,
                "{} {} {}{}",
                c.input.label(),
                c.comparator,
                c.threshold,
                c.input.unit()
            ),
            Self::Flag(check) => {
                let negation = if check.expected { "" } else { "not " };
                match check.flag {
                    Flag::LoopSuspended => write!(f, "loop {negation}suspended"),
                    Flag::PumpConnected => write!(f, "pump {negation}connected"),
                }
            }
            Self::And(children) => write_joined(f, children, " AND "),
            Self::Or(children) => write_joined(f, children, " OR "),
            Self::Not(Some(child)) => write!(f, "NOT {child}"),
            Self::Not(None) => f.write_str("NOT ?"),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    children: &[Trigger],
    separator: &str,
) -> std::fmt::Result {
    f.write_str("(")?;
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RuntimeSnapshot {
        RuntimeSnapshot {
            profile_percentage: 100,
            loop_suspended: false,
            loop_suspended_minutes: None,
            pump_last_connection_minutes: Some(12),
            pump_connected: true,
            glucose_mgdl: Some(182.0),
            taken_at: crate::time::now(),
        }
    }

    #[test]
    fn should_evaluate_profile_percent_leaf() {
        let s = snapshot();
        assert!(Trigger::profile_percent(Comparator::IsEqual, 100).evaluate(&s));
        assert!(!Trigger::profile_percent(Comparator::IsLesser, 100).evaluate(&s));
    }

    #[test]
    fn should_evaluate_glucose_leaf_and_treat_missing_reading_as_false() {
        let mut s = snapshot();
        let high = Trigger::glucose(Comparator::IsGreater, 180.0);
        assert!(high.evaluate(&s));
        s.glucose_mgdl = None;
        assert!(!high.evaluate(&s));
        assert!(!Trigger::glucose(Comparator::IsNotEqual, 180.0).evaluate(&s));
    }

    #[test]
    fn should_evaluate_elapsed_minute_leaves() {
        let mut s = snapshot();
        assert!(Trigger::pump_last_connection(Comparator::IsGreaterOrEqual, 10).evaluate(&s));
        assert!(!Trigger::loop_suspended_for(Comparator::IsGreaterOrEqual, 0).evaluate(&s));
        s.loop_suspended = true;
        s.loop_suspended_minutes = Some(45);
        assert!(Trigger::loop_suspended_for(Comparator::IsGreater, 30).evaluate(&s));
    }

    #[test]
    fn should_evaluate_flag_leaves() {
        let mut s = snapshot();
        assert!(Trigger::loop_suspended(false).evaluate(&s));
        assert!(!Trigger::loop_suspended(true).evaluate(&s));
        s.pump_connected = false;
        assert!(Trigger::pump_connected(false).evaluate(&s));
    }

    #[test]
    fn should_combine_children_with_and_or_not() {
        let s = snapshot();
        let yes = Trigger::profile_percent(Comparator::IsEqual, 100);
        let no = Trigger::loop_suspended(true);
        assert!(Trigger::and(vec![yes.clone(), Trigger::not(no.clone())]).evaluate(&s));
        assert!(!Trigger::and(vec![yes.clone(), no.clone()]).evaluate(&s));
        assert!(Trigger::or(vec![no.clone(), yes.clone()]).evaluate(&s));
        assert!(!Trigger::or(vec![no.clone(), no]).evaluate(&s));
        assert!(!Trigger::not(yes).evaluate(&s));
    }

    #[test]
    fn should_evaluate_empty_combinators_to_false() {
        let s = snapshot();
        assert!(!Trigger::and(vec![]).evaluate(&s));
        assert!(!Trigger::or(vec![]).evaluate(&s));
        assert!(!Trigger::Not(None).evaluate(&s));
    }

    #[test]
    fn should_return_same_answer_on_repeated_evaluation() {
        let s = snapshot();
        let tree = Trigger::or(vec![
            Trigger::and(vec![
                Trigger::glucose(Comparator::IsGreater, 150.0),
                Trigger::not(Trigger::loop_suspended(true)),
            ]),
            Trigger::pump_connected(false),
        ]);
        let first = tree.evaluate(&s);
        for _ in 0..10 {
            assert_eq!(tree.evaluate(&s), first);
        }
    }

    #[test]
    fn should_validate_leaf_domains() {
        assert!(Trigger::profile_percent(Comparator::IsEqual, 100).is_valid());
        assert!(!Trigger::profile_percent(Comparator::IsEqual, 5).is_valid());
        assert!(!Trigger::profile_percent(Comparator::IsEqual, 201).is_valid());
        assert!(Trigger::glucose(Comparator::IsLesser, 70.5).is_valid());
        assert!(!Trigger::glucose(Comparator::IsLesser, 20.0).is_valid());
        assert!(!Trigger::glucose(Comparator::IsLesser, f64::NAN).is_valid());
        assert!(!Trigger::pump_last_connection(Comparator::IsGreater, -1).is_valid());
        assert!(
            !Trigger::Compare(Comparison::new(
                Input::ProfilePercentage,
                Comparator::IsEqual,
                99.5
            ))
            .is_valid()
        );
    }

    #[test]
    fn should_validate_combinators_recursively() {
        let good = Trigger::profile_percent(Comparator::IsEqual, 100);
        let bad = Trigger::profile_percent(Comparator::IsEqual, 1);
        assert!(Trigger::and(vec![good.clone(), Trigger::not(good.clone())]).is_valid());
        assert!(!Trigger::and(vec![good.clone(), Trigger::or(vec![bad.clone()])]).is_valid());
        assert!(!Trigger::and(vec![]).is_valid());
        assert!(!Trigger::or(vec![]).is_valid());
        assert!(!Trigger::Not(None).is_valid());
        assert!(!Trigger::not(bad).is_valid());
    }

    #[test]
    fn should_encode_leaf_thresholds_with_wire_types() {
        let record = Trigger::profile_percent(Comparator::IsEqual, 100).to_record();
        assert_eq!(record.kind, "profile_percent");
        assert_eq!(
            record.data,
            json!({"comparator": "IS_EQUAL", "percentage": 100})
        );
        let record = Trigger::glucose(Comparator::IsGreater, 180.5).to_record();
        assert_eq!(record.data, json!({"comparator": "IS_GREATER", "bg": 180.5}));
    }

    #[test]
    fn should_encode_nested_children_as_records() {
        let tree = Trigger::and(vec![
            Trigger::profile_percent(Comparator::IsEqual, 100),
            Trigger::loop_suspended(false),
        ]);
        let record = tree.to_record();
        assert_eq!(record.kind, "and");
        assert_eq!(record.data["triggers"][1]["type"], "loop_suspended");
        assert_eq!(record.data["triggers"][1]["data"]["expected"], false);
    }

    #[test]
    fn should_keep_defaults_for_malformed_fields() {
        let mut leaf = Trigger::Compare(Comparison::default_for(Input::Glucose));
        leaf.apply_data(
            &json!({"comparator": "BIGGER", "bg": "high"}),
            Registry::global(),
        );
        assert_eq!(
            leaf,
            Trigger::Compare(Comparison::new(
                Input::Glucose,
                Comparator::IsGreater,
                100.0
            ))
        );
    }

    #[test]
    fn should_display_readable_summary() {
        let tree = Trigger::and(vec![
            Trigger::profile_percent(Comparator::IsEqual, 100),
            Trigger::loop_suspended(false),
        ]);
        assert_eq!(tree.to_string(), "(profile % == 100 AND loop not suspended)");
        assert_eq!(
            Trigger::glucose(Comparator::IsGreater, 180.0).to_string(),
            "glucose > 180 mg/dL"
        );
    }
}
