//! Human-readable durations for command-line options.

use std::time::Duration;

/// Unit suffixes, longest first so `ms` is not mistaken for `s`.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a duration such as `2s`, `500ms`, `1m` or `1h`.
///
/// A bare number is taken as seconds.
///
/// # Examples
/// ```
/// use thermistor_poller::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();
    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (number, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, factor)| src.strip_suffix(suffix).map(|n| (n, *factor)))
        .unwrap_or((src, 1_000));

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {src}"))?;

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration too large: {src}"))
}
