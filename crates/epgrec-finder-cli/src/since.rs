//! `--since` resolution.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};

/// Tries full datetime formats, returns `None` if both fail.
fn try_full_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Resolves the lower bound for program start times.
///
/// Without `--since`, uses `now` truncated to whole seconds.
/// Accepts: `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d` (midnight).
///
/// # Errors
///
/// Returns an error if the string does not match any known format.
pub fn resolve_since(since: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let Some(s) = since else {
        return now
            .with_nanosecond(0)
            .context("failed to truncate current time");
    };
    let s = s.trim();
    if let Some(dt) = try_full_datetime(s) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(&format!("{s} 00:00:00"), "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid --since datetime: {s} (expected \"YYYY-MM-DD HH:MM:SS\")"))
}
