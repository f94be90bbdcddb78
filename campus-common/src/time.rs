//! Calendar-date and clock utilities
//!
//! Enrollment expiry compares calendar dates, never timestamps, so every
//! comparison point goes through [`today`] / [`format_date`].

use chrono::{NaiveDate, Utc};

use crate::{Error, Result};

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a calendar date the way it is stored (`YYYY-MM-DD`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` calendar date from request input
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}
