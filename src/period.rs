// SPDX-License-Identifier: MIT

//! Calendar-period resolution for insight aggregation.
//!
//! Insight documents cover half-open calendar-month intervals. Events are
//! bucketed by the month of the parent workout's date, using the instant's
//! own UTC calendar fields (no timezone conversion).

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Compute the half-open month interval `[start, next_start)` containing
/// `instant`.
///
/// Month lengths and the December to January rollover are handled by
/// calendar-field arithmetic, never by fixed day offsets.
pub fn month_bounds(instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let year = instant.year();
    let month = instant.month();

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    (month_start(year, month), month_start(next_year, next_month))
}

/// Midnight UTC on the first day of the given month.
fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    // The first day of a valid (year, month) always exists.
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first day of month is a valid instant")
}
