//! Simulated CGM: a slow glucose wave so glucose rules have something to
//! react to.

use std::f64::consts::TAU;

/// Centre of the wave, mg/dL.
const BASELINE: f64 = 140.0;
/// Peak deviation from the baseline, mg/dL.
const AMPLITUDE: f64 = 80.0;
/// One full cycle, minutes.
const PERIOD_MINUTES: f64 = 180.0;

/// Glucose reading `elapsed_minutes` after the simulation started.
/// Readings are rounded to whole mg/dL like a real sensor.
#[must_use]
pub fn reading_at(elapsed_minutes: f64) -> f64 {
    let phase = (elapsed_minutes / PERIOD_MINUTES) * TAU;
    (BASELINE + AMPLITUDE * phase.sin()).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_at_baseline() {
        assert!((reading_at(0.0) - BASELINE).abs() < f64::EPSILON);
    }

    #[test]
    fn should_peak_and_trough_within_sensor_range() {
        let high = reading_at(PERIOD_MINUTES / 4.0);
        let low = reading_at(PERIOD_MINUTES * 3.0 / 4.0);
        assert!((high - 220.0).abs() < f64::EPSILON);
        assert!((low - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_stay_within_wave_bounds() {
        for minute in 0..600 {
            let value = reading_at(f64::from(minute));
            assert!((60.0..=220.0).contains(&value), "{value} out of bounds");
        }
    }
}
