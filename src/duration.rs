//! Human-readable durations such as `"5m"`, `"1h30m"` or `"300ms"`.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a duration made of one or more `<number><unit>` parts.
///
/// Supported units: `d`, `h`, `m`, `s`, `ms`. Numbers may carry a fraction
/// (`"1.5h"`). Input is case-insensitive and surrounding whitespace is
/// trimmed.
///
/// ```
/// use argocd_endpoint::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("2h45m").unwrap(), Duration::from_secs(9900));
/// assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let input = s.trim().to_lowercase();
    if input.is_empty() {
        anyhow::bail!("Duration is empty");
    }

    let mut rest = input.as_str();
    let mut total_ms: f64 = 0.0;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .context("Duration is missing a unit (d, h, m, s or ms)")?;
        if num_len == 0 {
            anyhow::bail!("Invalid duration {s:?}: expected a number");
        }
        let num: f64 = rest[..num_len]
            .parse()
            .with_context(|| format!("Invalid number in duration {s:?}"))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_ms = match &rest[..unit_len] {
            "d" => 24.0 * 60.0 * 60.0 * 1000.0,
            "h" => 60.0 * 60.0 * 1000.0,
            "m" => 60.0 * 1000.0,
            "s" => 1000.0,
            "ms" => 1.0,
            other => anyhow::bail!("Unknown duration unit {other:?} in {s:?}"),
        };
        rest = &rest[unit_len..];

        total_ms += num * unit_ms;
    }

    if !total_ms.is_finite() || total_ms > u64::MAX as f64 {
        anyhow::bail!("Duration is too large");
    }

    Ok(Duration::from_millis(total_ms.round() as u64))
}

/// Format a duration using the largest unit that divides it evenly.
pub fn format_duration(d: Duration) -> String {
    const MS_PER_DAY: u128 = 24 * 60 * 60 * 1000;
    const MS_PER_HOUR: u128 = 60 * 60 * 1000;
    const MS_PER_MINUTE: u128 = 60 * 1000;
    const MS_PER_SECOND: u128 = 1000;

    let ms = d.as_millis();
    for (unit, size) in [
        ("d", MS_PER_DAY),
        ("h", MS_PER_HOUR),
        ("m", MS_PER_MINUTE),
        ("s", MS_PER_SECOND),
    ] {
        if ms >= size && ms % size == 0 {
            return format!("{}{unit}", ms / size);
        }
    }
    format!("{ms}ms")
}

/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Use with `#[serde(serialize_with = "serialize_duration")]`.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
