//! Expiration window resolution.
//!
//! A relative spec has the form `<unit>-<count>` (e.g. `days-30`, `YEARS-2`)
//! and is resolved against the issuance instant. Absolute dates are parsed
//! on their own. Input that matches neither form resolves to `None`; callers
//! treat that as "no expiration", never as an error.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static RELATIVE_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(years|months|days|hours|minutes|seconds)-(\d+)$")
        .expect("relative expiry pattern is valid")
});

/// Last year a license instant may fall in. Later years do not fit the
/// four-digit `YYYY` of the wire format.
pub const MAX_EXPIRY_YEAR: i32 = 9999;

fn within_wire_range(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (instant.year() <= MAX_EXPIRY_YEAR).then_some(instant)
}

/// Naive date-time layouts accepted for absolute dates, read as UTC.
const NAIVE_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Unit of a relative expiry spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl ExpiryUnit {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "years" => Some(Self::Years),
            "months" => Some(Self::Months),
            "days" => Some(Self::Days),
            "hours" => Some(Self::Hours),
            "minutes" => Some(Self::Minutes),
            "seconds" => Some(Self::Seconds),
            _ => None,
        }
    }

    /// Returns the lowercase keyword for this unit.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Years => "years",
            Self::Months => "months",
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }
}

/// A parsed `<unit>-<count>` expiry spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeExpiry {
    unit: ExpiryUnit,
    count: u32,
}

impl RelativeExpiry {
    /// Creates a spec from its parts.
    #[must_use]
    pub const fn new(unit: ExpiryUnit, count: u32) -> Self {
        Self { unit, count }
    }

    /// Parses a spec string. Returns `None` for anything unrecognized,
    /// including counts that do not fit in 32 bits.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let captures = RELATIVE_SPEC.captures(spec)?;
        let unit = ExpiryUnit::from_keyword(&captures[1])?;
        let count = captures[2].parse().ok()?;
        Some(Self { unit, count })
    }

    #[must_use]
    pub fn unit(&self) -> ExpiryUnit {
        self.unit
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Advances `from` by this spec. Months and years follow the calendar
    /// (Jan 31 + 1 month = last day of February); smaller units are fixed
    /// durations. Returns `None` if the result overflows or lands after
    /// [`MAX_EXPIRY_YEAR`].
    #[must_use]
    pub fn apply(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let count = i64::from(self.count);
        let advanced = match self.unit {
            ExpiryUnit::Years => from.checked_add_months(Months::new(self.count.checked_mul(12)?)),
            ExpiryUnit::Months => from.checked_add_months(Months::new(self.count)),
            ExpiryUnit::Days => from.checked_add_days(Days::new(u64::from(self.count))),
            ExpiryUnit::Hours => from.checked_add_signed(TimeDelta::try_hours(count)?),
            ExpiryUnit::Minutes => from.checked_add_signed(TimeDelta::try_minutes(count)?),
            ExpiryUnit::Seconds => from.checked_add_signed(TimeDelta::try_seconds(count)?),
        }?;
        within_wire_range(advanced)
    }
}

impl fmt::Display for RelativeExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.unit.keyword(), self.count)
    }
}

/// Resolves an optional relative spec against the issuance instant.
#[must_use]
pub fn resolve_valid_to(now: DateTime<Utc>, spec: Option<&str>) -> Option<DateTime<Utc>> {
    let spec = spec?;
    let resolved = RelativeExpiry::parse(spec).and_then(|relative| relative.apply(now));
    if resolved.is_none() {
        tracing::warn!(spec, "unrecognized valid-to spec, license will carry no validTo");
    }
    resolved
}

/// Parses an absolute date.
///
/// Accepts RFC 3339, RFC 2822, naive date-times (read as UTC) and plain
/// `YYYY-MM-DD` dates (midnight UTC). Dates after [`MAX_EXPIRY_YEAR`] are
/// rejected.
#[must_use]
pub fn parse_absolute_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    parse_any_format(input).and_then(within_wire_range)
}

fn parse_any_format(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}
