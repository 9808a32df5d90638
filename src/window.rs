//! Which (day, hour) cells of an activity are open for voting.
//!
//! The first day opens at the begin hour and the last day closes at the end
//! hour, exclusive. Minutes are ignored on both ends, so an activity ending
//! at 17:30 offers 16:00 as its last slot.

use crate::errors::AppError;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DAY_FORMAT: &str = "%Y-%m-%d";
pub const HOURS_PER_DAY: u32 = 24;
pub const MAX_SPAN_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    begin: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    pub fn new(begin: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AppError> {
        if begin >= end {
            return Err(AppError::bad_request("begin must be before end"));
        }
        Ok(Self { begin, end })
    }

    pub fn parse(begin: &str, end: &str) -> Result<Self, AppError> {
        Self::new(parse_timestamp(begin)?, parse_timestamp(end)?)
    }

    /// New activities may not run longer than a week.
    pub fn ensure_bookable(&self) -> Result<(), AppError> {
        if self.end - self.begin > Duration::days(MAX_SPAN_DAYS) {
            return Err(AppError::bad_request(format!(
                "activity may not span more than {MAX_SPAN_DAYS} days"
            )));
        }
        Ok(())
    }

    /// Every calendar day from the begin date to the end date, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.end.date();
        let mut days = Vec::new();
        let mut current = self.begin.date();
        while current <= last {
            days.push(current);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }

    pub fn day_keys(&self) -> Vec<String> {
        self.days().into_iter().map(day_key).collect()
    }

    pub fn is_selectable(&self, day: NaiveDate, hour: u32) -> bool {
        if hour >= HOURS_PER_DAY {
            return false;
        }
        let first = self.begin.date();
        let last = self.end.date();
        if day < first || day > last {
            return false;
        }
        if day == first && hour < self.begin.hour() {
            return false;
        }
        !(day == last && hour >= self.end.hour())
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, AppError> {
    let invalid = || {
        AppError::bad_request(format!(
            "timestamp must look like yyyy-MM-dd HH:mm:ss, got {value:?}"
        ))
    };
    let parsed = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
    if parsed.format(TIMESTAMP_FORMAT).to_string() != value {
        return Err(invalid());
    }
    Ok(parsed)
}

pub fn parse_day(value: &str) -> Result<NaiveDate, AppError> {
    let invalid = || AppError::bad_request(format!("day must look like yyyy-MM-dd, got {value:?}"));
    let day = NaiveDate::parse_from_str(value, DAY_FORMAT).map_err(|_| invalid())?;
    // chrono accepts unpadded fields; stored keys must stay fixed-width
    if day_key(day) != value {
        return Err(invalid());
    }
    Ok(day)
}

pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}
