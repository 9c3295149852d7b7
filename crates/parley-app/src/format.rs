use chrono::{DateTime, Utc};

/// Relative "time ago" label for a message timestamp, same buckets as the
/// original client: under a minute, minutes, hours, then a short date.
pub fn format_relative(timestamp_ms: i64, now_ms: i64) -> String {
    let minutes = (now_ms - timestamp_ms) / 60_000;

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    if minutes < 1_440 {
        return format!("{}h ago", minutes / 60);
    }

    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(at) => at.format("%b %-d, %H:%M").to_string(),
        None => "some time ago".to_string(),
    }
}
