//! Duration strings such as `1s`, `250ms` or `1m30s`
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix. Valid units are `ns`, `us` (or `µs`),
//! `ms`, `s`, `m` and `h`. The bare string `0` is also accepted.

use std::time::Duration;

use super::ConfigError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Fraction digits beyond this are below nanosecond resolution for every unit
const MAX_FRACTION_DIGITS: usize = 18;

fn invalid(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parses a duration string like `1s`, `1.5s`, `500ms` or `1h2m3s`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] for empty or negative input,
/// a missing or unknown unit, or a value that overflows `u64` nanoseconds.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid(input, "empty duration"));
    }
    if s.starts_with('-') {
        return Err(invalid(input, "negative durations are not allowed"));
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, after_int) = rest.split_at(int_len);

        let (frac_digits, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid(input, "expected a number"));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid(input, "missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(input, &format!("unknown unit '{unit}'")))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits
                .parse()
                .map_err(|_| invalid(input, "value out of range"))?
        };

        let frac_digits = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
        let fraction_nanos = if frac_digits.is_empty() {
            0
        } else {
            let numerator: u128 = frac_digits
                .parse()
                .map_err(|_| invalid(input, "value out of range"))?;
            let exponent = u32::try_from(frac_digits.len())
                .map_err(|_| invalid(input, "value out of range"))?;
            numerator * scale / 10u128.pow(exponent)
        };

        total = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction_nanos))
            .and_then(|v| v.checked_add(total))
            .ok_or_else(|| invalid(input, "value out of range"))?;

        rest = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| invalid(input, "value out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

/// Formats a duration in the same notation [`parse_duration`] accepts.
///
/// Sub-second values use the largest exact unit (`250ms`, `15µs`); longer
/// values are split into hours, minutes and (fractional) seconds.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let nanos = duration.as_nanos();
    if nanos < NANOS_PER_SEC {
        return if nanos % NANOS_PER_MILLI == 0 {
            format!("{}ms", nanos / NANOS_PER_MILLI)
        } else if nanos % NANOS_PER_MICRO == 0 {
            format!("{}µs", nanos / NANOS_PER_MICRO)
        } else {
            format!("{nanos}ns")
        };
    }

    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    let subsec = duration.subsec_nanos();

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if subsec > 0 {
        let fraction = format!("{subsec:09}");
        out.push_str(&format!("{seconds}.{}s", fraction.trim_end_matches('0')));
    } else if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}
