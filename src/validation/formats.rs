//! Calendar and clock layouts accepted by date and time fields

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const CLOCK_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// Check a `YYYY-MM-DD` calendar date
#[must_use]
#[inline]
pub fn is_valid_date(text: &str) -> bool {
    // `[year]` also takes a leading sign
    text.starts_with(|c: char| c.is_ascii_digit()) && Date::parse(text, DATE).is_ok()
}

/// Check an `HH:MM` or `HH:MM:SS` 24-hour clock time
#[must_use]
#[inline]
pub fn is_valid_time(text: &str) -> bool {
    Time::parse(text, CLOCK).is_ok() || Time::parse(text, CLOCK_SECONDS).is_ok()
}
