//! Human duration strings such as `2h30m` or `1d 12h`.

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)([dhms])").expect("duration token pattern is valid")
});

/// Sum every `<n><unit>` token (units d/h/m/s) in seconds.
///
/// Text that isn't a token is ignored, so a string without any valid token
/// yields 0. Overflow saturates.
pub fn parse_seconds(input: &str) -> u64 {
    let lowered = input.to_lowercase();
    DURATION_TOKEN
        .captures_iter(&lowered)
        .map(|caps| {
            let value: u64 = caps[1].parse().unwrap_or(u64::MAX);
            let unit = match &caps[2] {
                "d" => 86_400,
                "h" => 3_600,
                "m" => 60,
                _ => 1,
            };
            value.saturating_mul(unit)
        })
        .fold(0u64, |total, secs| total.saturating_add(secs))
}

/// Parse a duration that must be strictly positive
pub fn parse_positive(input: &str) -> Option<chrono::Duration> {
    match parse_seconds(input) {
        0 => None,
        secs => chrono::Duration::try_seconds(secs.min(i64::MAX as u64) as i64),
    }
}

/// Compact rendering, e.g. `1d 2h 5m`
pub fn format_seconds(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let parts = [
        (secs / 86_400, "d"),
        (secs % 86_400 / 3_600, "h"),
        (secs % 3_600 / 60, "m"),
        (secs % 60, "s"),
    ];
    parts
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}
