//! Countdown computation for slug-encoded target times
//!
//! A slug is a fixed-width `YYYYMMDDHHMM` string read as wall-clock time in
//! UTC+8. The countdown is the signed difference between the slug instant
//! and "now", decomposed into days/hours/minutes/seconds.
//!
//! Decomposition uses floor division with a non-negative remainder, so a
//! target 30 seconds in the past yields `-1` days, `23` hours, `59` minutes
//! and `30` seconds. `diff_ms` always carries the raw signed delta.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

const SLUG_LEN: usize = 12;
const UTC8_OFFSET_SECS: i32 = 8 * 3600;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

#[derive(Debug, Error)]
pub enum CountdownError {
    #[error("Invalid slug. Format should be: YYYYMMDDHHMM (got {len} characters)")]
    InvalidSlugLength { len: usize },

    #[error("Invalid isoformat string: '{iso}' ({source})")]
    SlugParse {
        iso: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl CountdownError {
    /// Diagnostic label, used in logs only
    pub fn kind(&self) -> &'static str {
        match self {
            CountdownError::InvalidSlugLength { .. } => "invalid_slug_length",
            CountdownError::SlugParse { .. } => "slug_parse_error",
        }
    }
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Countdown payload returned by `GET /api/countdown/{slug}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub slug: String,
    pub now: String,
    #[serde(rename = "slugISO")]
    pub slug_iso: String,
    pub next: String,
    #[serde(rename = "diffMs")]
    pub diff_ms: i64,
    #[serde(rename = "diffday")]
    pub diff_day: i64,
    #[serde(rename = "diffhour")]
    pub diff_hour: i64,
    #[serde(rename = "diffminute")]
    pub diff_minute: i64,
    #[serde(rename = "diffsecond")]
    pub diff_second: i64,
}

/// Whole-second difference split into calendar-ish units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Breakdown {
    pub fn from_total_seconds(total: i64) -> Self {
        let days = total.div_euclid(SECS_PER_DAY);
        let remaining = total.rem_euclid(SECS_PER_DAY);
        let hours = remaining / SECS_PER_HOUR;
        let remaining = remaining % SECS_PER_HOUR;

        Self {
            days,
            hours,
            minutes: remaining / SECS_PER_MINUTE,
            seconds: remaining % SECS_PER_MINUTE,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * SECS_PER_DAY
            + self.hours * SECS_PER_HOUR
            + self.minutes * SECS_PER_MINUTE
            + self.seconds
    }
}

/// Fixed UTC+8 offset used for both the slug and "now"
pub fn utc8() -> FixedOffset {
    FixedOffset::east_opt(UTC8_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// Expands a slug into `YYYY-MM-DDTHH:MM:00+08:00`
///
/// Only the length is checked here. Characters past the twelfth are ignored.
pub fn slug_to_iso(slug: &str) -> Result<String, CountdownError> {
    let chars: Vec<char> = slug.chars().collect();
    if chars.len() < SLUG_LEN {
        return Err(CountdownError::InvalidSlugLength { len: chars.len() });
    }

    let part = |start: usize, end: usize| chars[start..end].iter().collect::<String>();

    Ok(format!(
        "{}-{}-{}T{}:{}:00+08:00",
        part(0, 4),
        part(4, 6),
        part(6, 8),
        part(8, 10),
        part(10, 12)
    ))
}

/// RFC 3339 with microseconds, omitting the fraction when it is zero
fn isoformat(instant: &DateTime<FixedOffset>) -> String {
    let precision = if instant.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    instant.to_rfc3339_opts(precision, false)
}

pub fn compute(slug: &str, clock: &dyn Clock) -> Result<Countdown, CountdownError> {
    let slug_iso = slug_to_iso(slug)?;
    let next = DateTime::parse_from_rfc3339(&slug_iso).map_err(|source| {
        CountdownError::SlugParse {
            iso: slug_iso.clone(),
            source,
        }
    })?;

    let now = clock.now().with_timezone(&utc8());
    let diff = next.signed_duration_since(now);
    let breakdown = Breakdown::from_total_seconds(diff.num_seconds());

    Ok(Countdown {
        slug: slug.to_string(),
        now: isoformat(&now),
        slug_iso,
        next: next.to_rfc3339_opts(SecondsFormat::Secs, false),
        diff_ms: diff.num_milliseconds(),
        diff_day: breakdown.days,
        diff_hour: breakdown.hours,
        diff_minute: breakdown.minutes,
        diff_second: breakdown.seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock_at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> FixedClock {
        let local = utc8().with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
        FixedClock(local.with_timezone(&Utc))
    }

    #[test]
    fn test_slug_to_iso() {
        assert_eq!(
            slug_to_iso("202501010930").unwrap(),
            "2025-01-01T09:30:00+08:00"
        );
        // Trailing characters are ignored
        assert_eq!(
            slug_to_iso("202501010930extra").unwrap(),
            "2025-01-01T09:30:00+08:00"
        );
    }

    #[test]
    fn test_short_slug_rejected() {
        for slug in ["", "2025", "20250101093"] {
            let err = compute(slug, &SystemClock).unwrap_err();
            assert!(matches!(err, CountdownError::InvalidSlugLength { .. }));
            assert_eq!(err.kind(), "invalid_slug_length");
        }
    }

    #[test]
    fn test_length_counts_characters() {
        // 12 multi-byte characters pass the length check and fail at parse time
        let err = compute("２０２５０１０１００００", &SystemClock).unwrap_err();
        assert!(matches!(err, CountdownError::SlugParse { .. }));
    }

    #[test]
    fn test_non_numeric_slug_fails_parse() {
        let err = compute("2025010100ab", &SystemClock).unwrap_err();
        assert!(matches!(err, CountdownError::SlugParse { .. }));
        assert_eq!(err.kind(), "slug_parse_error");
        assert!(err.to_string().contains("2025-01-01T00:ab:00+08:00"));
    }

    #[test]
    fn test_out_of_range_fields_fail_parse() {
        for slug in ["202513010000", "202502300000", "202501012500", "202501010060"] {
            let err = compute(slug, &SystemClock).unwrap_err();
            assert!(
                matches!(err, CountdownError::SlugParse { .. }),
                "slug {slug} should fail to parse"
            );
        }
    }

    #[test]
    fn test_exact_one_day() {
        let clock = clock_at(2024, 12, 31, 0, 0, 0);
        let result = compute("202501010000", &clock).unwrap();

        assert_eq!(result.slug, "202501010000");
        assert_eq!(result.now, "2024-12-31T00:00:00+08:00");
        assert_eq!(result.slug_iso, "2025-01-01T00:00:00+08:00");
        assert_eq!(result.next, "2025-01-01T00:00:00+08:00");
        assert_eq!(result.diff_ms, 86_400_000);
        assert_eq!(
            (result.diff_day, result.diff_hour, result.diff_minute, result.diff_second),
            (1, 0, 0, 0)
        );
    }

    #[test]
    fn test_fractional_now() {
        let base = utc8().with_ymd_and_hms(2024, 12, 30, 13, 28, 15).unwrap();
        let now = base.with_timezone(&Utc) + chrono::TimeDelta::milliseconds(250);
        let result = compute("202501010000", &FixedClock(now)).unwrap();

        assert_eq!(result.now, "2024-12-30T13:28:15.250000+08:00");
        assert_eq!(result.diff_ms, 124_304_750);
        assert_eq!(
            (result.diff_day, result.diff_hour, result.diff_minute, result.diff_second),
            (1, 10, 31, 44)
        );
    }

    #[test]
    fn test_now_fraction_only_when_nonzero() {
        let whole = clock_at(2024, 12, 30, 13, 28, 15);
        let result = compute("202501010000", &whole).unwrap();
        assert_eq!(result.now, "2024-12-30T13:28:15+08:00");

        let one_micro = FixedClock(whole.0 + chrono::TimeDelta::microseconds(1));
        let result = compute("202501010000", &one_micro).unwrap();
        assert_eq!(result.now, "2024-12-30T13:28:15.000001+08:00");
    }

    #[test]
    fn test_past_target_uses_floor_division() {
        let clock = clock_at(2025, 1, 1, 0, 0, 30);
        let result = compute("202501010000", &clock).unwrap();

        assert_eq!(result.diff_ms, -30_000);
        assert_eq!(
            (result.diff_day, result.diff_hour, result.diff_minute, result.diff_second),
            (-1, 23, 59, 30)
        );
    }

    #[test]
    fn test_breakdown_recombines() {
        for total in [0, 1, 59, 60, 3_599, 3_600, 86_399, 86_400, 1_234_567, 98_765_432] {
            let breakdown = Breakdown::from_total_seconds(total);
            assert_eq!(breakdown.total_seconds(), total);
            assert!((0..24).contains(&breakdown.hours));
            assert!((0..60).contains(&breakdown.minutes));
            assert!((0..60).contains(&breakdown.seconds));
        }
    }

    #[test]
    fn test_recombination_matches_diff_ms() {
        let clock = clock_at(2024, 3, 15, 7, 5, 9);
        let result = compute("202601010000", &clock).unwrap();
        let recombined = result.diff_day * SECS_PER_DAY
            + result.diff_hour * SECS_PER_HOUR
            + result.diff_minute * SECS_PER_MINUTE
            + result.diff_second;
        assert_eq!(recombined, result.diff_ms / 1000);
    }

    #[test]
    fn test_serialized_field_names() {
        let clock = clock_at(2024, 12, 31, 0, 0, 0);
        let value = serde_json::to_value(compute("202501010000", &clock).unwrap()).unwrap();
        for key in [
            "slug", "now", "slugISO", "next", "diffMs", "diffday", "diffhour", "diffminute",
            "diffsecond",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
