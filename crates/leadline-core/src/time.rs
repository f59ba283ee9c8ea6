//! Canonical timestamp handling. Lead modification timestamps double as
//! optimistic-concurrency tokens, so every timestamp that reaches a
//! comparison must be in one exact textual form: RFC 3339, millisecond
//! precision, UTC with a trailing `Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current instant in the canonical form, e.g. `2025-03-14T09:26:53.589Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Re-render any valid RFC 3339 timestamp (any offset, any precision) in
/// the canonical form. Returns `None` for unparseable input.
pub fn canonicalize(ts: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}
