//! Conversion of raw RouterOS property strings into metric values.
//!
//! Every property a device returns is a string. A [`Converter`] decides how
//! such a string becomes the `f64` stored in a Prometheus series.

use crate::error::ParseValueError;
use std::fmt;
use std::sync::Arc;

/// Signature of a user supplied conversion function.
pub type ConvertFn = dyn Fn(&str) -> Result<f64, ParseValueError> + Send + Sync;

/// Strategy used to convert a raw property value.
#[derive(Clone, Default)]
pub enum Converter {
    /// Plain floating point parse.
    #[default]
    Numeric,
    /// `true`/`yes` as 1, `false`/`no` as 0.
    Bool,
    /// RouterOS duration (`1w2d3h4m5s`, `3d01:02:03`) in seconds.
    Duration,
    /// Arbitrary function.
    Custom(Arc<ConvertFn>),
}

impl Converter {
    /// Wrap a closure as a converter.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<f64, ParseValueError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn convert(&self, value: &str) -> Result<f64, ParseValueError> {
        match self {
            Self::Numeric => parse_number(value),
            Self::Bool => parse_bool(value),
            Self::Duration => parse_duration(value),
            Self::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => f.write_str("Numeric"),
            Self::Bool => f.write_str("Bool"),
            Self::Duration => f.write_str("Duration"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub fn parse_number(value: &str) -> Result<f64, ParseValueError> {
    Ok(value.parse::<f64>()?)
}

pub fn parse_bool(value: &str) -> Result<f64, ParseValueError> {
    match value {
        "true" | "yes" => Ok(1.0),
        "false" | "no" => Ok(0.0),
        other => Err(ParseValueError::Bool(other.to_string())),
    }
}

/// Parse a RouterOS duration into seconds.
///
/// RouterOS prints durations as a run of `<number><unit>` pairs (`w`, `d`,
/// `h`, `m`, `s`, `ms`, `us`), optionally followed by an `hh:mm:ss` clock
/// part, e.g. `1w2d3h4m5s`, `3d01:02:03`, `10ms` or `00:00:05`.
pub fn parse_duration(value: &str) -> Result<f64, ParseValueError> {
    let invalid = || ParseValueError::Duration(value.to_string());

    let value = value.trim();
    if value.is_empty() {
        return Err(invalid());
    }

    let (units, clock) = match value.find(':') {
        Some(colon) => {
            let start = value[..colon]
                .rfind(|c: char| c.is_ascii_alphabetic())
                .map_or(0, |i| i + 1);
            (&value[..start], Some(&value[start..]))
        }
        None => (value, None),
    };

    let mut total = 0.0;

    if let Some(clock) = clock {
        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let hours: f64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: f64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: f64 = parts[2].parse().map_err(|_| invalid())?;
        total += hours * 3600.0 + minutes * 60.0 + seconds;
    }

    let mut rest = units;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let amount: f64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let multiplier = match &rest[..unit_len] {
            "w" => 604_800.0,
            "d" => 86_400.0,
            "h" => 3_600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            "us" => 0.000_001,
            _ => return Err(invalid()),
        };
        total += amount * multiplier;
        rest = &rest[unit_len..];
    }

    Ok(total)
}
