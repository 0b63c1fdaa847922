//! Timestamp utilities
//!
//! Timestamps are stored as INTEGER Unix nanoseconds (UTC), so stored values
//! compare exactly against a reference time carrying sub-second precision.
//! Timeslot durations are whole seconds. These helpers convert at the
//! database boundary.

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};

/// Nanoseconds per second, for SQL mixing timestamps with durations
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Get current UTC timestamp
///
/// Only request entry points call this; everything below them takes an
/// explicit reference time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to stored Unix nanoseconds
///
/// Only instants between 1677 and 2262 fit; anything else is
/// [`Error::InvalidArgument`].
pub fn to_epoch_nanos(timestamp: DateTime<Utc>) -> Result<i64> {
    timestamp.timestamp_nanos_opt().ok_or_else(|| {
        Error::InvalidArgument(format!("Timestamp out of storable range: {}", timestamp))
    })
}

/// Convert stored Unix nanoseconds back to a timestamp
pub fn from_epoch_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_nanos(nanos)
}

/// Convert stored duration seconds to a chrono duration
pub fn seconds_to_duration(seconds: i64) -> Duration {
    Duration::seconds(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_epoch_conversion_keeps_subsecond_precision() {
        let t = Utc.with_ymd_and_hms(2013, 3, 1, 9, 30, 0).unwrap()
            + Duration::nanoseconds(700_000_123);
        assert_eq!(from_epoch_nanos(to_epoch_nanos(t).unwrap()), t);
    }

    #[test]
    fn test_subsecond_ordering_preserved() {
        let base = Utc.with_ymd_and_hms(2013, 3, 1, 0, 0, 0).unwrap();
        let earlier = to_epoch_nanos(base + Duration::milliseconds(300)).unwrap();
        let later = to_epoch_nanos(base + Duration::milliseconds(700)).unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_unstorable_timestamp_rejected() {
        let far_future = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            to_epoch_nanos(far_future),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(seconds_to_duration(1800), Duration::minutes(30));
        assert_eq!(seconds_to_duration(0), Duration::zero());
    }
}
