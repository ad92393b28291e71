// Copyright Tern Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for the `timestamp` type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, as microseconds since the Unix epoch.
///
/// This is the slot encoding of [`ScalarType::Timestamp`]: eight
/// little-endian bytes whose numeric order is chronological order.
/// Conversion to and from calendar types happens only at the edges.
///
/// [`ScalarType::Timestamp`]: crate::ScalarType::Timestamp
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct TimestampValue(i64);

impl TimestampValue {
    /// Wraps a count of microseconds since the Unix epoch.
    pub fn from_micros(micros: i64) -> TimestampValue {
        TimestampValue(micros)
    }

    /// The count of microseconds since the Unix epoch.
    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// Converts from a calendar datetime, truncating sub-microsecond
    /// precision.
    pub fn from_datetime(datetime: &DateTime<Utc>) -> TimestampValue {
        TimestampValue(datetime.timestamp_micros())
    }

    /// Converts to a calendar datetime, or `None` if the value is outside
    /// chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }

    /// Reads a value from its little-endian slot encoding.
    pub fn from_slot_bytes(slot: &[u8]) -> TimestampValue {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&slot[..8]);
        TimestampValue(i64::from_le_bytes(buf))
    }

    /// The value's little-endian slot encoding.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl From<i64> for TimestampValue {
    fn from(micros: i64) -> TimestampValue {
        TimestampValue(micros)
    }
}

impl fmt::Display for TimestampValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.naive_utc()),
            // Out of calendar range; the raw count is still meaningful.
            None => write!(f, "{} us since epoch", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_round_trip() {
        let ts = TimestampValue::from_micros(253433923200 * 1_000_000);
        let datetime = ts.to_datetime().unwrap();
        assert_eq!(TimestampValue::from_datetime(&datetime), ts);
    }

    #[test]
    fn order_is_chronological() {
        let earlier = TimestampValue::from_micros(-1);
        let epoch = TimestampValue::from_micros(0);
        let later = TimestampValue::from_micros(1_000_000);
        assert!(earlier < epoch);
        assert!(epoch < later);
    }

    #[test]
    fn slot_round_trip() {
        let ts = TimestampValue::from_micros(1_234_567_890_123_456);
        assert_eq!(TimestampValue::from_slot_bytes(&ts.to_le_bytes()), ts);
    }

    #[test]
    fn display() {
        let ts = TimestampValue::from_micros(0);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00");
    }
}
