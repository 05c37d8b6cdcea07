//! Partial publication dates.
//!
//! Bibliographic dates arrive at year, year-month or full-day precision,
//! either as text (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) or as a structured
//! `[year, month?, day?]` triple. Each resolves to a representative UTC
//! timestamp (missing month → January, missing day → 1st) for ordering and
//! layout, and to a display string matching its precision.

use chrono::{DateTime, Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half of a 365-day year, in milliseconds.
pub const HALF_YEAR_MS: i64 = 31_536_000_000 / 2;

/// Years a date may carry, matching the four-digit textual shape.
const YEAR_RANGE: std::ops::RangeInclusive<i64> = 0..=9999;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").unwrap());

/// A date known to year, year-month or full-day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialDate {
    YearOnly(i32),
    YearMonth(i32, u32),
    FullDate(i32, u32, u32),
}

impl PartialDate {
    /// Parse one of the three textual shapes. Calendar-invalid values
    /// (`2023-13`, `2023-02-30`) are rejected like unknown shapes.
    pub fn parse(text: &str) -> Result<Self> {
        let unresolved = || Error::UnresolvedDate(text.to_string());
        let caps = DATE_SHAPE.captures(text.trim()).ok_or_else(unresolved)?;

        let year: i32 = caps[1].parse().map_err(|_| unresolved())?;
        let month: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let day: Option<u32> = caps.get(3).and_then(|d| d.as_str().parse().ok());

        Self::from_components(year, month, day).ok_or_else(unresolved)
    }

    /// Build from a structured `[year, month?, day?]` triple. Years outside
    /// `0..=9999` are rejected, as the textual shapes cannot express them.
    pub fn from_parts(parts: &[i64]) -> Result<Self> {
        let unresolved = || Error::UnresolvedDate(format!("{:?}", parts));
        let to_u32 = |v: &i64| u32::try_from(*v).ok();

        let year = parts
            .first()
            .filter(|y| YEAR_RANGE.contains(*y))
            .and_then(|y| i32::try_from(*y).ok())
            .ok_or_else(unresolved)?;
        let month = match parts.get(1) {
            Some(m) => Some(to_u32(m).ok_or_else(unresolved)?),
            None => None,
        };
        let day = match parts.get(2) {
            Some(d) => Some(to_u32(d).ok_or_else(unresolved)?),
            None => None,
        };

        Self::from_components(year, month, day).ok_or_else(unresolved)
    }

    fn from_components(year: i32, month: Option<u32>, day: Option<u32>) -> Option<Self> {
        let date = match (month, day) {
            (None, _) => Self::YearOnly(year),
            (Some(m), None) => Self::YearMonth(year, m),
            (Some(m), Some(d)) => Self::FullDate(year, m, d),
        };
        date.representative_date().map(|_| date)
    }

    pub fn year(&self) -> i32 {
        match *self {
            Self::YearOnly(y) | Self::YearMonth(y, _) | Self::FullDate(y, _, _) => y,
        }
    }

    /// The calendar day standing in for this date.
    pub fn representative_date(&self) -> Option<NaiveDate> {
        match *self {
            Self::YearOnly(y) => NaiveDate::from_ymd_opt(y, 1, 1),
            Self::YearMonth(y, m) => NaiveDate::from_ymd_opt(y, m, 1),
            Self::FullDate(y, m, d) => NaiveDate::from_ymd_opt(y, m, d),
        }
    }

    /// Representative timestamp in UTC milliseconds.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.representative_date().and_then(date_millis)
    }

    /// Human-readable form at the input's precision.
    pub fn display(&self) -> String {
        match (self, self.representative_date()) {
            (Self::YearOnly(y), _) => y.to_string(),
            (Self::YearMonth(..), Some(date)) => date.format("%B %Y").to_string(),
            (Self::FullDate(..), Some(date)) => date.format("%B %-d, %Y").to_string(),
            (Self::YearMonth(y, m), None) => format!("{:04}-{:02}", y, m),
            (Self::FullDate(y, m, d), None) => format!("{:04}-{:02}-{:02}", y, m, d),
        }
    }
}

/// A resolved publication date, or the raw text when no shape matched.
///
/// Unrecognized dates keep their text for display but have no timestamp,
/// which excludes their record from timeline layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationDate {
    Known(PartialDate),
    Unrecognized(String),
}

impl PublicationDate {
    /// Resolve a textual date. Never fails: unknown shapes fail closed.
    pub fn parse(text: &str) -> Self {
        match PartialDate::parse(text) {
            Ok(date) => Self::Known(date),
            Err(_) => {
                tracing::debug!("Unrecognized date format: {:?}", text);
                Self::Unrecognized(text.to_string())
            }
        }
    }

    pub fn partial(&self) -> Option<PartialDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn timestamp_millis(&self) -> Option<i64> {
        self.partial().and_then(|d| d.timestamp_millis())
    }

    pub fn display(&self) -> String {
        match self {
            Self::Known(date) => date.display(),
            Self::Unrecognized(raw) => raw.clone(),
        }
    }
}

impl From<PartialDate> for PublicationDate {
    fn from(date: PartialDate) -> Self {
        Self::Known(date)
    }
}

fn date_millis(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Timestamp of 1 January of `year`, 00:00 UTC.
pub fn year_start_millis(year: i32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(date_millis)
}

/// Calendar year (UTC) containing the timestamp.
pub fn year_of_millis(ts: i64) -> Option<i32> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.year())
}
