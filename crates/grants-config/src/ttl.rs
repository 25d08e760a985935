//! Human-readable durations for logs and dev pages

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

const UNITS: [(u64, &str); 4] = [
    (DAY_MS, "day"),
    (HOUR_MS, "hour"),
    (MINUTE_MS, "minute"),
    (SECOND_MS, "second"),
];

/// Format a millisecond TTL in its largest whole unit
///
/// The count is rounded to the nearest unit, so 90 minutes reads as
/// `"2 hours"`. A count that rounds up to a whole larger unit moves to that
/// unit, so just under a day reads as `"1 day"`. Values under a second are
/// reported in milliseconds.
#[must_use]
pub fn format_ttl_to_readable(ttl_ms: u64) -> String {
    let Some(mut index) = UNITS.iter().position(|(unit, _)| ttl_ms >= *unit) else {
        return pluralize(ttl_ms, "millisecond");
    };

    loop {
        let (unit_ms, name) = UNITS[index];
        let count = rounded(ttl_ms, unit_ms);
        match index.checked_sub(1) {
            Some(larger) if count.saturating_mul(unit_ms) >= UNITS[larger].0 => index = larger,
            _ => return pluralize(count, name),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded(ttl_ms: u64, unit_ms: u64) -> u64 {
    (ttl_ms as f64 / unit_ms as f64).round() as u64
}

fn pluralize(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
