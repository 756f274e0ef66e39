// A simple module to define the time types used in the project
//
// These helpers read the wall clock and are only meant for timestamps
// attached to recorded calls, mocked responses and log lines.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Millis timestamps used to determine it using its type
pub type TimestampMillis = u64;

// A clock set before the unix epoch is reported as the epoch itself
#[inline]
pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

// Return timestamp in milliseconds
// We cast it to u64 as we have plenty of time before it overflows (year 584,942,417 AD)
pub fn get_current_time_in_millis() -> TimestampMillis {
    get_current_time().as_millis() as TimestampMillis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_follow_wall_clock() {
        let before = get_current_time().as_millis() as TimestampMillis;
        let millis = get_current_time_in_millis();
        assert!(millis >= before);
        assert!(millis > 0);
    }
}
