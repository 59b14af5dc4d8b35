//! Parsing of relative durations such as `--since 1h30m`.

use crate::error::{CopilotError, Result};
use chrono::Duration;
use regex::Regex;
use std::sync::OnceLock;

static DURATION_RE: OnceLock<Regex> = OnceLock::new();
static COMPONENT_RE: OnceLock<Regex> = OnceLock::new();

fn duration_re() -> &'static Regex {
    DURATION_RE.get_or_init(|| Regex::new(r"^-?([0-9]+(ms|h|m|s))+$").unwrap())
}

fn component_re() -> &'static Regex {
    COMPONENT_RE.get_or_init(|| Regex::new(r"([0-9]+)(ms|h|m|s)").unwrap())
}

/// Parse a sequence of `<integer><unit>` components (units `h`, `m`, `s`,
/// `ms`), optionally negated with a leading `-`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || CopilotError::InvalidDuration(input.to_string());
    let trimmed = input.trim();
    if !duration_re().is_match(trimmed) {
        return Err(invalid());
    }

    let mut millis: i64 = 0;
    for caps in component_re().captures_iter(trimmed) {
        let value: i64 = caps[1].parse().map_err(|_| invalid())?;
        let unit_ms = match &caps[2] {
            "h" => 3_600_000,
            "m" => 60_000,
            "s" => 1_000,
            _ => 1,
        };
        millis = value
            .checked_mul(unit_ms)
            .and_then(|v| millis.checked_add(v))
            .ok_or_else(invalid)?;
    }
    if trimmed.starts_with('-') {
        millis = -millis;
    }
    Ok(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("5m").unwrap(), Duration::minutes(5));
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::minutes(90)
        );
        assert_eq!(parse_duration("250ms").unwrap(), Duration::milliseconds(250));
        assert_eq!(parse_duration("1m500ms").unwrap(), Duration::milliseconds(60_500));
    }

    #[test]
    fn negative_and_zero_parse() {
        assert_eq!(parse_duration("-5m").unwrap(), Duration::minutes(-5));
        assert_eq!(parse_duration("0s").unwrap(), Duration::zero());
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "5", "m", "5 minutes", "1d", "1.5h"] {
            let err = parse_duration(input).unwrap_err();
            assert!(matches!(err, CopilotError::InvalidDuration(_)), "{input}");
        }
    }
}
