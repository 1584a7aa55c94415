//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_fired`, event times, suspension starts, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole minutes elapsed between `since` and `at`, clamped at zero.
#[must_use]
pub fn minutes_between(since: Timestamp, at: Timestamp) -> i64 {
    (at - since).num_minutes().max(0)
}
