//! Comparator: relational operator between a measured value and a threshold.

use serde::{Deserialize, Serialize};

/// Operator applied as `measured <op> threshold`.
///
/// Comparison is exact on the stored representation: callers quantize both
/// sides (whole percent, whole minutes) before comparing. With a NaN operand
/// every operator yields `false` except [`Comparator::IsNotEqual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    #[default]
    IsEqual,
    IsNotEqual,
    IsGreater,
    IsGreaterOrEqual,
    IsLesser,
    IsLesserOrEqual,
}

impl Comparator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::IsEqual,
        Self::IsNotEqual,
        Self::IsGreater,
        Self::IsGreaterOrEqual,
        Self::IsLesser,
        Self::IsLesserOrEqual,
    ];

    /// Evaluate `measured <op> threshold`.
    #[must_use]
    pub fn compare<T: PartialOrd>(self, measured: T, threshold: T) -> bool {
        match self {
            Self::IsEqual => measured == threshold,
            Self::IsNotEqual => measured != threshold,
            Self::IsGreater => measured > threshold,
            Self::IsGreaterOrEqual => measured >= threshold,
            Self::IsLesser => measured < threshold,
            Self::IsLesserOrEqual => measured <= threshold,
        }
    }

    /// Short mathematical symbol, used in summaries.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::IsEqual => "==",
            Self::IsNotEqual => "!=",
            Self::IsGreater => ">",
            Self::IsGreaterOrEqual => ">=",
            Self::IsLesser => "<",
            Self::IsLesserOrEqual => "<=",
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compare_equal_values() {
        assert!(Comparator::IsEqual.compare(100, 100));
        assert!(!Comparator::IsEqual.compare(99, 100));
        assert!(!Comparator::IsNotEqual.compare(100, 100));
        assert!(Comparator::IsNotEqual.compare(99, 100));
    }

    #[test]
    fn should_compare_greater_values() {
        assert!(Comparator::IsGreater.compare(180.0, 150.0));
        assert!(!Comparator::IsGreater.compare(150.0, 150.0));
        assert!(Comparator::IsGreaterOrEqual.compare(150.0, 150.0));
        assert!(!Comparator::IsGreaterOrEqual.compare(149.0, 150.0));
    }

    #[test]
    fn should_compare_lesser_values() {
        assert!(Comparator::IsLesser.compare(60, 70));
        assert!(!Comparator::IsLesser.compare(70, 70));
        assert!(Comparator::IsLesserOrEqual.compare(70, 70));
        assert!(!Comparator::IsLesserOrEqual.compare(71, 70));
    }

    #[test]
    fn should_treat_nan_as_unequal_to_everything() {
        for op in Comparator::ALL {
            let expected = op == Comparator::IsNotEqual;
            assert_eq!(op.compare(f64::NAN, 1.0), expected, "{op:?}");
            assert_eq!(op.compare(1.0, f64::NAN), expected, "{op:?}");
        }
    }

    #[test]
    fn should_use_screaming_snake_case_on_the_wire() {
        let json = serde_json::to_string(&Comparator::IsGreaterOrEqual).unwrap();
        assert_eq!(json, "\"IS_GREATER_OR_EQUAL\"");
        let parsed: Comparator = serde_json::from_str("\"IS_LESSER\"").unwrap();
        assert_eq!(parsed, Comparator::IsLesser);
    }

    #[test]
    fn should_display_symbols() {
        assert_eq!(Comparator::IsEqual.to_string(), "==");
        assert_eq!(Comparator::IsLesserOrEqual.to_string(), "<=");
    }
}
