use chrono::Duration;

use crate::error::{Error, Result};

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;

/// Parses a duration such as `240h`, `1h30m` or `1.5s`.
///
/// Accepts the same notation helm uses for its own duration flags: an optional
/// sign followed by one or more `<number><unit>` pairs, where the number may
/// carry a fraction and the unit is one of `ns`, `us`, `µs`, `ms`, `s`, `m`
/// or `h`. A bare `0` is the only value allowed without a unit.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |reason: String| Error::InvalidDuration {
        input: input.to_string(),
        reason,
    };

    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid("empty duration".to_string()));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let (number, tail) = split_at_first(rest, |c| !(c.is_ascii_digit() || c == '.'));
        let (unit, tail) = split_at_first(tail, |c| c.is_ascii_digit() || c == '.');
        if number.is_empty() || number == "." {
            return Err(invalid(format!("expected a number before {unit:?}")));
        }
        if number.matches('.').count() > 1 {
            return Err(invalid(format!("malformed number {number:?}")));
        }
        if unit.is_empty() {
            return Err(invalid("missing unit in duration".to_string()));
        }
        let scale = unit_scale(unit).ok_or_else(|| invalid(format!("unknown unit {unit:?}")))?;
        let nanos = scaled(number, scale).ok_or_else(|| invalid("out of range".to_string()))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| invalid("out of range".to_string()))?;
        rest = tail;
    }

    let total = i64::try_from(total).map_err(|_| invalid("out of range".to_string()))?;
    Ok(Duration::nanoseconds(if negative { -total } else { total }))
}

fn split_at_first(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    s.split_at(s.find(pred).unwrap_or(s.len()))
}

fn unit_scale(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Multiplies a decimal literal by `scale` without going through floats.
fn scaled(number: &str, scale: i128) -> Option<i128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    // Digits beyond nanosecond precision cannot contribute.
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: i128 = fraction.parse().ok()?;
        let divisor = 10_i128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits.checked_mul(scale)? / divisor)?;
    }
    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        zero = { "0", Duration::zero() },
        hours = { "240h", Duration::hours(240) },
        minutes = { "5m", Duration::minutes(5) },
        seconds = { "30s", Duration::seconds(30) },
        millis = { "500ms", Duration::milliseconds(500) },
        micros = { "7us", Duration::microseconds(7) },
        micro_sign = { "7µs", Duration::microseconds(7) },
        nanos = { "12ns", Duration::nanoseconds(12) },
        compound = { "1h30m", Duration::minutes(90) },
        fraction = { "1.5h", Duration::minutes(90) },
        leading_dot = { ".5s", Duration::milliseconds(500) },
        zero_with_unit = { "0s", Duration::zero() },
        explicit_plus = { "+8h", Duration::hours(8) },
        negative = { "-2m", Duration::minutes(-2) },
    )]
    fn parses(input: &str, expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[parameterized(
        empty = { "", "empty duration" },
        missing_unit = { "1", "missing unit in duration" },
        trailing_number = { "1h30", "missing unit in duration" },
        unknown_unit = { "3d", "unknown unit" },
        no_number = { "h", "expected a number" },
        lone_dot = { ".h", "expected a number" },
        two_dots = { "1.2.3s", "malformed number" },
        overflow = { "99999999999999999999h", "out of range" },
    )]
    fn rejects(input: &str, reason: &str) {
        let err = parse_duration(input).unwrap_err().to_string();
        assert!(err.contains(reason), "{err:?} does not mention {reason:?}");
    }
}
