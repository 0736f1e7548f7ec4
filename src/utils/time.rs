//! Time utilities for time-zone aware date checks
//!
//! Every "today" in the pipeline is evaluated in the configured zone rather
//! than the host's local time, so window checks are deterministic.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Format used for persisted timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of air dates returned by the resolver.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate and parse an IANA time zone name such as `Asia/Shanghai`
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Time zone name is empty".to_string());
    }
    name.parse::<Tz>()
        .map_err(|e| format!("Invalid time zone '{}': {}", name, e))
}

pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Calendar date of "now" in the given zone
pub fn today_in(tz: Tz) -> NaiveDate {
    now_in(tz).date_naive()
}

/// Current time in `tz`, rendered with [`TIMESTAMP_FORMAT`]
pub fn timestamp_in(tz: Tz) -> String {
    now_in(tz).format(TIMESTAMP_FORMAT).to_string()
}

/// Whole days from `today` until `date_str` (negative when in the past).
///
/// Returns `None` when the date does not parse.
pub fn days_until(date_str: &str, today: NaiveDate) -> Option<i64> {
    match NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT) {
        Ok(date) => Some((date - today).num_days()),
        Err(e) => {
            debug!("Unparseable date '{}': {}", date_str, e);
            None
        }
    }
}

/// True when `date_str` falls in `[today, today + days]`.
pub fn is_within_days(date_str: &str, days: u32, today: NaiveDate) -> bool {
    match days_until(date_str, today) {
        Some(diff) => (0..=i64::from(days)).contains(&diff),
        None => false,
    }
}
