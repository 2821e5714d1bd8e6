//! Timestamp helpers.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string with microsecond precision,
/// e.g. `2024-01-01T00:00:00.000000+00:00`.
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
