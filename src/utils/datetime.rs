use chrono::{Duration, Weekday};

/// Full English name of a weekday, e.g. `Tuesday`.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Splits a duration into whole days, hours, minutes and seconds.
/// Negative durations clamp to zero.
pub fn split_countdown(duration: Duration) -> (i64, i64, i64, i64) {
    let total = duration.num_seconds().max(0);
    (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    )
}

pub fn format_countdown(duration: Duration) -> String {
    let (days, hours, minutes, seconds) = split_countdown(duration);
    format!("{days} days, {hours} hours, {minutes} minutes and {seconds} seconds")
}
