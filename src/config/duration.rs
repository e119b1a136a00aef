//! Duration parsing for config files and environment variables.
//!
//! Accepts human-readable strings like "500ms", "30s", "2m", or a bare
//! number of seconds.

use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Parse a duration string like "500ms", "30s", "2m" or "45".
///
/// Returns `None` if the string cannot be parsed.
///
/// ```
/// use memongo::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("30s"), Some(Duration::from_secs(30)));
/// assert_eq!(parse_duration_string("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration_string("45"), Some(Duration::from_secs(45)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();

    let (digits, unit): (&str, fn(u64) -> Option<Duration>) =
        if let Some(ms) = s.strip_suffix("ms") {
            (ms, |n| Some(Duration::from_millis(n)))
        } else if let Some(secs) = s.strip_suffix('s') {
            (secs, |n| Some(Duration::from_secs(n)))
        } else if let Some(mins) = s.strip_suffix('m') {
            (mins, |n| n.checked_mul(60).map(Duration::from_secs))
        } else {
            (s, |n| Some(Duration::from_secs(n)))
        };

    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().and_then(unit)
}

/// Format a duration so that [`parse_duration_string`] reads it back.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_millis() != 0 || d.as_secs() == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}s", d.as_secs())
    }
}

/// serde helper for optional duration fields written as strings.
pub(crate) fn deserialize_opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_duration_string(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("100ms"), Some(Duration::from_millis(100)));
        assert_eq!(parse_duration_string("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration_string(" 10 "), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("ms"), None);
        assert_eq!(parse_duration_string("abc"), None);
        assert_eq!(parse_duration_string("-5s"), None);
        assert_eq!(parse_duration_string("1h"), None);
        assert_eq!(parse_duration_string("999999999999999999m"), None);
    }

    #[test]
    fn test_format_is_parseable() {
        for d in [
            Duration::from_secs(30),
            Duration::from_millis(1500),
            Duration::from_millis(200),
            Duration::ZERO,
        ] {
            assert_eq!(parse_duration_string(&format_duration(d)), Some(d));
        }
    }
}
