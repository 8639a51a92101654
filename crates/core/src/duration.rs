//! Human-readable durations for configuration values.
//!
//! Durations are written the way operators type them: `"5s"`, `"1 second"`,
//! `"10 minutes"`, `"2h 30min"`. The keywords `disabled`, `zero`, `unlimited`
//! and the empty string all mean "off".

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Keywords that switch a duration-driven feature off.
pub const OFF_KEYWORDS: &[&str] = &["", "disabled", "zero", "unlimited"];

/// Parse a duration string, returning `None` when the feature is off.
///
/// A value that parses to zero is also treated as off.
pub fn parse_duration(field: &'static str, value: &str) -> Result<Option<Duration>, ConfigError> {
    let trimmed = value.trim();
    if OFF_KEYWORDS
        .iter()
        .any(|k| trimmed.eq_ignore_ascii_case(k))
    {
        return Ok(None);
    }

    // humantime wants "1second", operators write "1 second"
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let parsed = humantime::parse_duration(&compact).map_err(|_| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })?;

    if parsed.is_zero() {
        Ok(None)
    } else {
        Ok(Some(parsed))
    }
}

/// Render a duration back into the configuration syntax.
pub fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(d) if !d.is_zero() => humantime::format_duration(d).to_string(),
        _ => "disabled".to_string(),
    }
}

/// Serde adapter for `Option<Duration>` fields (`None` = disabled).
pub mod optional {
    use super::*;

    /// Serialize as a human-readable string.
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_duration(*value))
    }

    /// Deserialize from a human-readable string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_duration("duration", &raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for plain `Duration` fields (off keywords map to zero).
pub mod required {
    use super::*;

    /// Serialize as a human-readable string.
    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_duration(Some(*value)))
    }

    /// Deserialize from a human-readable string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        parse_duration("duration", &raw)
            .map(Option::unwrap_or_default)
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for lists of durations; entries that are off are dropped.
pub mod list {
    use super::*;
    use serde::ser::SerializeSeq;

    /// Serialize as a list of human-readable strings.
    pub fn serialize<S: Serializer>(value: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(value.len()))?;
        for d in value {
            seq.serialize_element(&format_duration(Some(*d)))?;
        }
        seq.end()
    }

    /// Deserialize from a list of human-readable strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        let raw = Vec::<String>::deserialize(d)?;
        let mut out = Vec::with_capacity(raw.len());
        for entry in raw {
            if let Some(parsed) =
                parse_duration("rotation time", &entry).map_err(serde::de::Error::custom)?
            {
                out.push(parsed);
            }
        }
        Ok(out)
    }
}
