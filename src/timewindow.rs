//! Conversion between operator-facing wall-clock strings and the UTC
//! timestamps the Zenduty API stores.
//!
//! Operators write `YYYY-MM-DD HH:MM` together with an IANA zone name. The API
//! speaks RFC 3339 in UTC with a literal `Z` suffix and optional fractional
//! seconds.
//!
//! Local times that do not exist (spring-forward gap) are shifted by the
//! length of the gap: the offset in force just after the transition is used,
//! so `2024-03-10 02:30` in `America/New_York` becomes `2024-03-10T06:30:00Z`.
//! Ambiguous local times (fall-back overlap) take the earlier instant, which
//! is the pre-transition offset.

use chrono::{
    DateTime, LocalResult, NaiveDateTime, Offset, SecondsFormat, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ProviderError, Result};

/// Wall-clock layout accepted from and rendered to operators.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DISPLAY_PATTERN: &str = "YYYY-MM-DD HH:MM";

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const WIRE_PATTERN: &str = "RFC 3339 UTC (YYYY-MM-DDTHH:MM:SS[.fff]Z)";

// chrono accepts unpadded fields, a signed year and leading whitespace, so the
// shape is checked before parsing.
static DISPLAY_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}$").expect("display pattern is valid")
});

static WIRE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-5][0-9](\.[0-9]+)?Z$")
        .expect("wire pattern is valid")
});

pub fn resolve_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ProviderError::UnknownTimezone(name.to_string()))
}

/// Interpret `display` in `tz` and return the instant as RFC 3339 UTC.
pub fn to_utc(display: &str, tz: &str) -> Result<String> {
    let zone = resolve_timezone(tz)?;
    let naive = parse_display(display)?;
    let instant = localize(zone, naive).with_timezone(&Utc);
    Ok(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Render an API timestamp as wall-clock time in `tz`.
pub fn from_utc(absolute: &str, tz: &str) -> Result<String> {
    let invalid = || ProviderError::InvalidTimeFormat {
        value: absolute.to_string(),
        expected: WIRE_PATTERN,
    };
    if !WIRE_SHAPE.is_match(absolute) {
        return Err(invalid());
    }
    let naive = NaiveDateTime::parse_from_str(absolute, WIRE_FORMAT).map_err(|_| invalid())?;
    let zone = resolve_timezone(tz)?;
    let local = zone.from_utc_datetime(&naive);
    Ok(local.format(DISPLAY_FORMAT).to_string())
}

/// Like [`from_utc`] but for read paths: a failure is logged and yields `None`
/// so the rest of the resource can still be populated.
pub fn from_utc_lenient(field: &str, absolute: &str, tz: &str) -> Option<String> {
    match from_utc(absolute, tz) {
        Ok(display) => Some(display),
        Err(err) => {
            tracing::warn!(
                field,
                value = absolute,
                timezone = tz,
                error = %err,
                "Leaving time field unset"
            );
            None
        }
    }
}

fn parse_display(display: &str) -> Result<NaiveDateTime> {
    let invalid = || ProviderError::InvalidTimeFormat {
        value: display.to_string(),
        expected: DISPLAY_PATTERN,
    };
    if !DISPLAY_SHAPE.is_match(display) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(display, DISPLAY_FORMAT).map_err(|_| invalid())
}

fn localize(zone: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Offset in force if the wall-clock value were UTC, then the
            // offset at the instant that guess points to.
            let before = zone.offset_from_utc_datetime(&naive).fix();
            let shifted = naive - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            let after = zone.offset_from_utc_datetime(&shifted).fix();
            let instant = naive - TimeDelta::seconds(i64::from(after.local_minus_utc()));
            zone.from_utc_datetime(&instant)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kolkata_to_utc() {
        assert_eq!(
            to_utc("2024-01-15 09:00", "Asia/Kolkata").unwrap(),
            "2024-01-15T03:30:00Z"
        );
    }

    #[test]
    fn test_new_york_winter_and_summer() {
        assert_eq!(
            to_utc("2024-01-15 09:00", "America/New_York").unwrap(),
            "2024-01-15T14:00:00Z"
        );
        assert_eq!(
            to_utc("2024-07-01 09:00", "America/New_York").unwrap(),
            "2024-07-01T13:00:00Z"
        );
    }

    #[test]
    fn test_spring_forward_gap_uses_post_transition_offset() {
        assert_eq!(
            to_utc("2024-03-10 02:30", "America/New_York").unwrap(),
            "2024-03-10T06:30:00Z"
        );
    }

    #[test]
    fn test_fall_back_overlap_prefers_earlier_instant() {
        // 01:30 happens twice; EDT (-4) comes first.
        assert_eq!(
            to_utc("2024-11-03 01:30", "America/New_York").unwrap(),
            "2024-11-03T05:30:00Z"
        );
    }

    #[test]
    fn test_round_trip_away_from_transitions() {
        let zones = ["UTC", "Asia/Kolkata", "Europe/Berlin", "America/New_York", "Australia/Sydney"];
        let samples = ["2024-01-15 09:00", "2024-06-30 23:59", "2025-12-31 00:00", "2024-02-29 12:15"];
        for tz in zones {
            for display in samples {
                let wire = to_utc(display, tz).unwrap();
                assert_eq!(from_utc(&wire, tz).unwrap(), display, "{} in {}", display, tz);
            }
        }
    }

    #[test]
    fn test_from_utc_accepts_fractional_seconds() {
        assert_eq!(
            from_utc("2024-01-15T03:30:00.123456Z", "Asia/Kolkata").unwrap(),
            "2024-01-15 09:00"
        );
        assert_eq!(
            from_utc("2024-01-15T03:30:00Z", "Asia/Kolkata").unwrap(),
            "2024-01-15 09:00"
        );
    }

    #[test]
    fn test_from_utc_rejects_garbage() {
        assert!(matches!(
            from_utc("garbage", "UTC"),
            Err(ProviderError::InvalidTimeFormat { .. })
        ));
        // Only the Z form is accepted.
        assert!(from_utc("2024-01-15T03:30:00+05:30", "UTC").is_err());
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            to_utc("2024-01-15 09:00", "Mars/Olympus"),
            Err(ProviderError::UnknownTimezone(ref name)) if name == "Mars/Olympus"
        ));
        assert!(matches!(
            from_utc("2024-01-15T03:30:00Z", ""),
            Err(ProviderError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_to_utc_rejects_bad_layout() {
        for bad in ["2024-01-15", "2024-01-15T09:00", "15/01/2024 09:00", "2024-01-15 09:00:00"] {
            assert!(
                matches!(to_utc(bad, "UTC"), Err(ProviderError::InvalidTimeFormat { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_to_utc_requires_padded_fields() {
        let bad = [
            "2024-1-5 9:00",
            "2024-01-15 9:05",
            "2024-01-15 9:5",
            " 2024-01-15 09:00",
            "+2024-01-15 09:00",
            "2024-01-15 09:00 ",
            "2024-02-30 09:00",
        ];
        for value in bad {
            assert!(
                matches!(to_utc(value, "UTC"), Err(ProviderError::InvalidTimeFormat { .. })),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_from_utc_requires_padded_fields() {
        let bad = [
            "2024-1-15T3:30:00Z",
            "2024-01-15T03:30:60Z",
            " 2024-01-15T03:30:00Z",
            "+2024-01-15T03:30:00Z",
            "2024-01-15T03:30Z",
        ];
        for value in bad {
            assert!(
                matches!(from_utc(value, "UTC"), Err(ProviderError::InvalidTimeFormat { .. })),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_lenient_returns_none() {
        assert_eq!(from_utc_lenient("start_time", "garbage", "UTC"), None);
        assert_eq!(
            from_utc_lenient("start_time", "2024-01-15T03:30:00Z", "UTC").as_deref(),
            Some("2024-01-15 03:30")
        );
    }
}
