//! Calendar-date arithmetic shared by the prediction and statistics engines
//!
//! Every value here is a `NaiveDate`: a plain day on the proleptic Gregorian
//! calendar with no time-of-day and no zone, so daylight-saving transitions
//! can never shift a result by an hour or a day. Means are computed in exact
//! decimal arithmetic and rounded half-up, which keeps `28.55` at `28.6`
//! where binary floating point would drift to `28.5`.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::error::{CycleFemError, Result};

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Number of calendar days covered by `[start, end]`, both ends counted
pub fn inclusive_span(start: NaiveDate, end: NaiveDate) -> i64 {
    days_between(start, end) + 1
}

/// Move `date` by `days` (either direction). `None` only past chrono's date range.
pub fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// Exact arithmetic mean of whole-day samples, `None` when there are none
pub fn mean(samples: &[i64]) -> Option<Decimal> {
    if samples.is_empty() {
        return None;
    }
    let total: i64 = samples.iter().sum();
    Some(Decimal::from(total) / Decimal::from(samples.len() as u64))
}

/// Round half-up (toward positive infinity on ties) to `decimal_places`
pub fn round_half_up(value: Decimal, decimal_places: u32) -> Decimal {
    let scale = Decimal::from(10u64.pow(decimal_places));
    let mut rounded = ((value * scale) + dec!(0.5)).floor() / scale;
    rounded.rescale(decimal_places);
    rounded
}

/// Round half-up to a whole number of days
pub fn round_half_up_days(value: Decimal) -> i64 {
    // a mean of i64 samples always lies between them, so it fits
    (value + dec!(0.5)).floor().to_i64().unwrap_or_default()
}

/// Parse a calendar date from user-supplied text.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `DD/MM/YYYY` and ISO-8601 timestamps,
/// whose leading date part is taken as written.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];
    for format in &formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    if let Some(date_part) = trimmed.get(..10) {
        let separator = trimmed[10..].chars().next();
        if matches!(separator, Some('T') | Some(' ')) {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
                return Ok(date);
            }
        }
    }

    Err(CycleFemError::Validation(format!(
        "Unable to parse date: {}",
        input
    )))
}
