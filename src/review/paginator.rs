//! Day-bucketed pagination over the unknown store.
//!
//! Keys sort by arrival time, so the messages of one local calendar day form
//! a contiguous run of the sorted key list. A page is located with two
//! binary searches for the string forms of the day's start and end.

use chrono::{Duration, NaiveDate, TimeZone};
use thiserror::Error;

use crate::store::{format_key, key_timestamp};

/// Added to the start of a day before truncating back to midnight, so days
/// lengthened or shortened by a daylight-saving shift still end at the next
/// local midnight.
const DAY_END_SLACK_HOURS: i64 = 36;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginateError {
    #[error("message key '{0}' does not start with a timestamp")]
    MalformedKey(String),
    #[error("timestamp {0} cannot be placed on the calendar")]
    OutOfRange(i64),
}

/// Bounds of one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub start: i64,
    /// Start of the following day; the window is `[start, end)`.
    pub end: i64,
    /// e.g. "Sunday, September 09, 2001"
    pub label: String,
}

/// One day of unknown messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPage {
    /// Keys of the day, most recent first.
    pub keys: Vec<String>,
    pub date: String,
    /// Timestamp of the closest earlier message, or 0.
    pub prior: i64,
    pub start: i64,
    pub end: i64,
    /// Timestamp of the closest later message, or 0.
    pub next: i64,
}

#[derive(Debug, Clone)]
pub struct ReviewPaginator<Tz> {
    tz: Tz,
}

impl<Tz: TimeZone> ReviewPaginator<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn day_window(&self, timestamp: i64) -> Result<DayWindow, PaginateError> {
        let local = self
            .tz
            .timestamp_opt(timestamp, 0)
            .earliest()
            .ok_or(PaginateError::OutOfRange(timestamp))?;

        let day = local.date_naive();
        let start = self.midnight(day).ok_or(PaginateError::OutOfRange(timestamp))?;

        let later = start + DAY_END_SLACK_HOURS * 60 * 60;
        let next_day = self
            .tz
            .timestamp_opt(later, 0)
            .earliest()
            .ok_or(PaginateError::OutOfRange(later))?
            .date_naive();
        let end = self.midnight(next_day).ok_or(PaginateError::OutOfRange(later))?;

        Ok(DayWindow {
            start,
            end,
            label: day.format("%A, %B %d, %Y").to_string(),
        })
    }

    /// First instant of `day`. Where local midnight is skipped by a
    /// daylight-saving jump, the day starts an hour later.
    fn midnight(&self, day: NaiveDate) -> Option<i64> {
        let naive = day.and_hms_opt(0, 0, 0)?;
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| self.tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .map(|dt| dt.timestamp())
    }

    /// Builds the page for the day containing `target`.
    ///
    /// `sorted_keys` must be in ascending order. Without a target the day of
    /// the most recent key is used, or `now` if there are no keys.
    pub fn page(&self, sorted_keys: &[String], target: Option<i64>, now: i64) -> Result<ReviewPage, PaginateError> {
        let timestamp = match target {
            Some(ts) => ts,
            None => match sorted_keys.last() {
                Some(key) => timestamp_of(key)?,
                None => now,
            },
        };

        let window = self.day_window(timestamp)?;

        let start_key = format_key(window.start);
        let end_key = format_key(window.end);
        let start_index = sorted_keys.partition_point(|k| k.as_str() < start_key.as_str());
        let end_index = sorted_keys.partition_point(|k| k.as_str() < end_key.as_str());

        let mut keys = sorted_keys[start_index..end_index].to_vec();
        keys.reverse();

        let prior = match start_index {
            0 => 0,
            i => timestamp_of(&sorted_keys[i - 1])?,
        };
        let next = match sorted_keys.get(end_index) {
            Some(key) => timestamp_of(key)?,
            None => 0,
        };

        Ok(ReviewPage {
            keys,
            date: window.label,
            prior,
            start: window.start,
            end: window.end,
            next,
        })
    }
}

fn timestamp_of(key: &str) -> Result<i64, PaginateError> {
    key_timestamp(key).ok_or_else(|| PaginateError::MalformedKey(key.to_string()))
}
