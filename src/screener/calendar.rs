//! Trading-day arithmetic
//!
//! Weekdays only; exchange holidays are not modelled.

use chrono::{Datelike, NaiveDate, Weekday};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in the half-open range `[start, end)`, 0 when `end <= start`
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let span = (end - start).num_days();
    if span <= 0 {
        return 0;
    }

    let full_weeks = span / 7;
    let mut count = full_weeks * 5;
    let mut day = start + chrono::Duration::days(full_weeks * 7);
    while day < end {
        if is_weekday(day) {
            count += 1;
        }
        day = day.succ_opt().unwrap_or(end);
    }
    count
}

/// Trading days from `as_of` to `expiry`, never less than 1
pub fn trading_days_to_expiry(as_of: NaiveDate, expiry: NaiveDate) -> u32 {
    let days = business_days_between(as_of, expiry).max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}
