//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Number of seconds in a nanosecond
pub const SECONDS_PER_NANO: f64 = 1e-9;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration.num_nanoseconds().map(nanos_to_seconds)
}

/// Convert a signed number of nanoseconds into seconds.
pub fn nanos_to_seconds(nanos: i64) -> f64 {
    nanos as f64 * SECONDS_PER_NANO
}

/// Signed difference `t1 - t0` between two monotonic nanosecond timestamps.
///
/// The subtraction is done on the integers so that large timestamps do not
/// lose precision before the difference is taken.
pub fn elapsed_nanos(t1: u64, t0: u64) -> i64 {
    t1.wrapping_sub(t0) as i64
}
