//! Time and timestamp utilities

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Format a Unix timestamp as `HH:MM:SS` (UTC), used by the log export
pub fn format_clock(timestamp: u64) -> String {
    match Utc.timestamp_opt(timestamp as i64, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => "00:00:00".to_string(),
    }
}
