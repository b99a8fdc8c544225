//! Simulated "current date" for the case engine.
//!
//! Every case timestamp and every "days waiting" figure is derived from this
//! clock, never from wall-clock time, so advancing it fully controls what the
//! agent cycle sees.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualClock(DateTime<Utc>);

impl VirtualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }

    /// Clock set to midnight UTC on the given day.
    pub fn at_date(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.0
    }

    /// Move forward by exactly `days` calendar days.
    ///
    /// Rejects zero and negative values; the clock is left untouched on error.
    pub fn advance(&mut self, days: i64) -> Result<DateTime<Utc>, CaseError> {
        if days <= 0 {
            return Err(CaseError::InvalidArgument(format!(
                "days must be positive, got {}",
                days
            )));
        }
        let next = self
            .0
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| {
                CaseError::InvalidArgument(format!("advancing by {} days overflows the clock", days))
            })?;
        self.0 = next;
        Ok(next)
    }

    /// Whole days elapsed from `since` to the clock. Never negative.
    pub fn days_since(&self, since: DateTime<Utc>) -> i64 {
        (self.0 - since).num_days().max(0)
    }
}

impl fmt::Display for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
