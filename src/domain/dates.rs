//! Calendar helpers. Business days follow the configured UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::errors::AppError;

/// Half-open `[start, end)` instant window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Local calendar date of an instant.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match offset.from_local_datetime(&midnight).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// From the start of `first` to the start of the day after `last`.
///
/// `last` must have a following calendar day; the error names `endDate`.
pub fn days_window(
    first: NaiveDate,
    last: NaiveDate,
    offset: FixedOffset,
) -> Result<Window, AppError> {
    let after_last = last.succ_opt().ok_or_else(|| {
        AppError::validation(vec!["endDate: data fora do intervalo suportado".to_string()])
    })?;
    Ok(Window {
        start: start_of_day(first, offset),
        end: start_of_day(after_last, offset),
    })
}

pub fn today_window(now: DateTime<Utc>, offset: FixedOffset) -> Result<Window, AppError> {
    let today = local_date(now, offset);
    days_window(today, today, offset)
}

/// `dd/mm/yyyy a dd/mm/yyyy`
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} a {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"))
}

pub fn nights_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}
