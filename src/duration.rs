//! Human-readable intervals for the refresh loop: "30s", "5m", "1h".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Parses an interval such as `"30s"`, `"5m"`, `"2h"` or `"1d"`.
///
/// Case-insensitive, surrounding whitespace ignored. Zero is rejected: a
/// refresh loop cannot tick every 0 seconds.
///
/// ```
/// use walletsum::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("5M").unwrap(), Duration::from_secs(300));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_ascii_lowercase();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Interval is empty");
    };
    let multiplier = match unit {
        'd' => SECS_PER_DAY,
        'h' => SECS_PER_HOUR,
        'm' => SECS_PER_MINUTE,
        's' => 1,
        _ => anyhow::bail!("Interval {s:?} must end with d, h, m, or s"),
    };

    let count: u64 = s[..s.len() - 1]
        .parse()
        .with_context(|| format!("Invalid number in interval {s:?}"))?;
    if count == 0 {
        anyhow::bail!("Interval must be greater than zero");
    }
    let secs = count
        .checked_mul(multiplier)
        .context("Interval is too large")?;

    Ok(Duration::from_secs(secs))
}

/// Formats with the largest unit that divides the interval evenly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= SECS_PER_DAY && secs % SECS_PER_DAY == 0 {
        format!("{}d", secs / SECS_PER_DAY)
    } else if secs >= SECS_PER_HOUR && secs % SECS_PER_HOUR == 0 {
        format!("{}h", secs / SECS_PER_HOUR)
    } else if secs >= SECS_PER_MINUTE && secs % SECS_PER_MINUTE == 0 {
        format!("{}m", secs / SECS_PER_MINUTE)
    } else {
        format!("{secs}s")
    }
}

/// For `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// For `#[serde(serialize_with = "serialize_duration")]`, so `config` output
/// shows the same form the file accepts.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
