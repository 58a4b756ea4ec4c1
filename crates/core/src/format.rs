//! Date and time labels for chat rendering
//!
//! Calendar-day comparisons use the date components in the time zone of
//! `now`, never elapsed hours: 23:00 yesterday and 08:00 today are one
//! calendar day apart.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

/// Label used for separators on the current day
pub const TODAY: &str = "Today";
/// Label used for separators on the previous day
pub const YESTERDAY: &str = "Yesterday";

/// Separator label for the day `ts` falls on, seen from `now`
pub fn day_label<Tz>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = ts.with_timezone(&now.timezone());
    let day = local.date_naive();
    let today = now.date_naive();

    if day == today {
        TODAY.to_string()
    } else if today.pred_opt() == Some(day) {
        YESTERDAY.to_string()
    } else {
        local.format("%b %-d, %Y").to_string()
    }
}

/// Hour and minute shown next to a message
pub fn time_label<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.format("%H:%M").to_string()
}

/// Timestamp shown in the conversation list
///
/// Just the time for today, otherwise the short date and time.
pub fn preview_label<Tz>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = ts.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        time_label(&local)
    } else {
        local.format("%b %-d, %H:%M").to_string()
    }
}

/// Whether two instants fall on the same calendar day in `tz`
pub fn same_day<Tz: TimeZone>(a: &DateTime<Utc>, b: &DateTime<Utc>, tz: &Tz) -> bool {
    a.with_timezone(tz).date_naive() == b.with_timezone(tz).date_naive()
}
