//! Coarse relative timestamps for list views.

use chrono::{DateTime, Utc};

/// Render `ts` relative to `now`.
///
/// | Age | Output |
/// |-----|--------|
/// | under 60 minutes | `"<N>m ago"` |
/// | under 24 hours | `"<N>h ago"` (whole hours, rounded down) |
/// | otherwise | calendar date, `M/D/YYYY` |
///
/// Ages are measured in whole minutes. Each band includes its lower bound,
/// so exactly 60 minutes is `"1h ago"`. Timestamps in the future read as
/// `"0m ago"`.
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - ts).num_minutes().max(0);
    if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 24 * 60 {
        format!("{}h ago", minutes / 60)
    } else {
        ts.format("%-m/%-d/%Y").to_string()
    }
}
