//! `google.protobuf.Timestamp` ↔ `chrono::DateTime<Utc>` conversions.
//!
//! ```ignore
//! use grpc_helpers::conversions::*;
//!
//! let now = chrono::Utc::now();
//! let wire = datetime_to_timestamp(now);
//! let back = timestamp_to_datetime(&wire)?;
//! ```

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use thiserror::Error;

/// Earliest instant representable by `google.protobuf.Timestamp` (0001-01-01T00:00:00Z).
const MIN_SECONDS: i64 = -62_135_596_800;
/// Latest instant representable by `google.protobuf.Timestamp` (9999-12-31T23:59:59Z).
const MAX_SECONDS: i64 = 253_402_300_799;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("timestamp nanos out of range: {0}")]
    NanosOutOfRange(i32),

    #[error("timestamp seconds out of range: {0}")]
    SecondsOutOfRange(i64),
}

/// Convert a wire timestamp into a UTC datetime.
///
/// Rejects values outside the range defined for `google.protobuf.Timestamp`
/// instead of normalizing them.
pub fn timestamp_to_datetime(timestamp: &Timestamp) -> Result<DateTime<Utc>, ConversionError> {
    if !(0..1_000_000_000).contains(&timestamp.nanos) {
        return Err(ConversionError::NanosOutOfRange(timestamp.nanos));
    }
    if !(MIN_SECONDS..=MAX_SECONDS).contains(&timestamp.seconds) {
        return Err(ConversionError::SecondsOutOfRange(timestamp.seconds));
    }

    DateTime::from_timestamp(timestamp.seconds, timestamp.nanos as u32)
        .ok_or(ConversionError::SecondsOutOfRange(timestamp.seconds))
}

/// Convert a UTC datetime into a wire timestamp.
pub fn datetime_to_timestamp(datetime: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: datetime.timestamp(),
        nanos: datetime.timestamp_subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_preserves_nanos() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let wire = datetime_to_timestamp(dt);
        assert_eq!(wire.nanos, 123_456_789);
        assert_eq!(timestamp_to_datetime(&wire).unwrap(), dt);
    }

    #[test]
    fn test_negative_nanos_rejected() {
        let wire = Timestamp {
            seconds: 0,
            nanos: -1,
        };
        assert_eq!(
            timestamp_to_datetime(&wire),
            Err(ConversionError::NanosOutOfRange(-1))
        );
    }

    #[test]
    fn test_seconds_beyond_year_9999_rejected() {
        let wire = Timestamp {
            seconds: MAX_SECONDS + 1,
            nanos: 0,
        };
        assert!(matches!(
            timestamp_to_datetime(&wire),
            Err(ConversionError::SecondsOutOfRange(_))
        ));
    }

    #[test]
    fn test_epoch() {
        let wire = Timestamp::default();
        assert_eq!(timestamp_to_datetime(&wire).unwrap(), DateTime::UNIX_EPOCH);
    }
}
