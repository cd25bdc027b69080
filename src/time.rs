//! Instants and fixed-step time ranges.
//!
//! All arithmetic is done on unix seconds. `chrono` is only used at the edges
//! to parse and format instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PointcastError, Result};

/// A point in time as seconds since the unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn new(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Seconds since 1970-01-01T00:00Z
    pub fn seconds(&self) -> i64 {
        self.0
    }

    pub fn plus(&self, seconds: i64) -> Self {
        Self(self.0 + seconds)
    }

    /// Round down to the nearest multiple of `step` seconds
    pub fn floor(&self, step: i64) -> Self {
        Self(self.0 - self.0.rem_euclid(step))
    }

    /// Round up to the nearest multiple of `step` seconds
    pub fn ceil(&self, step: i64) -> Self {
        let rem = self.0.rem_euclid(step);
        if rem == 0 {
            *self
        } else {
            Self(self.0 + step - rem)
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.0, 0)
    }

    /// Format as `YYYY-MM-DDTHH:MM`
    pub fn iso8601(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M").to_string(),
            None => self.0.to_string(),
        }
    }

    /// Parse an ISO 8601 instant.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC assumed) and plain dates.
    pub fn parse_iso8601(s: &str) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.timestamp()));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(Utc.from_utc_datetime(&ndt).timestamp()));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self(Utc.from_utc_datetime(&ndt).timestamp()));
            }
        }
        Err(PointcastError::InvalidParameter {
            param: "time".to_string(),
            message: format!("Cannot parse '{}' as an ISO 8601 date or time", s),
        })
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso8601())
    }
}

/// A half-open range `[start, end)` walked with a fixed step.
///
/// `end - start` does not have to be a multiple of the step; the last instant
/// is the largest `start + k*dt` still below `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
    dt_seconds: i64,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp, dt_seconds: i64) -> Result<Self> {
        if dt_seconds <= 0 {
            return Err(PointcastError::InvalidTimeRange {
                message: format!("Time step must be positive, got {}s", dt_seconds),
            });
        }
        if end < start {
            return Err(PointcastError::InvalidTimeRange {
                message: format!("End {} is before start {}", end, start),
            });
        }
        Ok(Self {
            start,
            end,
            dt_seconds,
        })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn dt_seconds(&self) -> i64 {
        self.dt_seconds
    }

    /// Number of instants, `ceil((end - start) / dt)`
    pub fn len(&self) -> usize {
        let span = self.end.0 - self.start.0;
        ((span + self.dt_seconds - 1) / self.dt_seconds) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t < self.end
    }

    /// Whole steps between `start` and `t`. `None` if `t` precedes `start`.
    pub fn offset_of(&self, t: Timestamp) -> Option<usize> {
        if t < self.start {
            return None;
        }
        Some(((t.0 - self.start.0) / self.dt_seconds) as usize)
    }

    /// Snap onto a coarser cadence: start floored, end ceiled, step set to `dt_seconds`.
    pub fn align_to(&self, dt_seconds: i64) -> Self {
        Self {
            start: self.start.floor(dt_seconds),
            end: self.end.ceil(dt_seconds),
            dt_seconds,
        }
    }

    /// Grow by `by` seconds on both sides.
    pub fn expand(&self, by: i64) -> Self {
        self.extend(by, by)
    }

    /// Move start `before` seconds earlier and end `after` seconds later.
    pub fn extend(&self, before: i64, after: i64) -> Self {
        Self {
            start: self.start.plus(-before),
            end: self.end.plus(after),
            dt_seconds: self.dt_seconds,
        }
    }

    pub fn iter(&self) -> TimeRangeIter {
        TimeRangeIter {
            next: self.start,
            end: self.end,
            dt_seconds: self.dt_seconds,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} ({}s)", self.start, self.end, self.dt_seconds)
    }
}

impl<'a> IntoIterator for &'a TimeRange {
    type Item = Timestamp;
    type IntoIter = TimeRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the instants of a [`TimeRange`]
#[derive(Debug, Clone)]
pub struct TimeRangeIter {
    next: Timestamp,
    end: Timestamp,
    dt_seconds: i64,
}

impl Iterator for TimeRangeIter {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Timestamp> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.plus(self.dt_seconds);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next >= self.end {
            0
        } else {
            let span = self.end.0 - self.next.0;
            ((span + self.dt_seconds - 1) / self.dt_seconds) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TimeRangeIter {}
