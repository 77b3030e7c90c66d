//! Billing period handling
//!
//! A billing period is one calendar month, written `YYYY-MM`. Periods are
//! totally ordered (year first, then month) so the string form and the
//! value form sort identically.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Errors related to billing periods
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidFormat(String),

    #[error("Month {0} is out of range (1-12)")]
    MonthOutOfRange(u32),

    #[error("Year {0} is out of range (1-9999)")]
    YearOutOfRange(i32),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// A calendar month identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    /// Earliest representable period, `0001-01`
    pub const MIN: BillingPeriod = BillingPeriod { year: 1, month: 1 };
    /// Latest representable period, `9999-12`
    pub const MAX: BillingPeriod = BillingPeriod { year: 9999, month: 12 };

    /// Creates a new billing period
    ///
    /// # Arguments
    ///
    /// * `year` - Four-digit year
    /// * `month` - Month number, 1 = January
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange(month));
        }
        if !(1..=9999).contains(&year) {
            return Err(PeriodError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// The period containing the given date, clamped to `MIN..=MAX`
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month()).unwrap_or(if date.year() < 1 {
            Self::MIN
        } else {
            Self::MAX
        })
    }

    /// The period containing `now` in the given timezone
    pub fn at(now: DateTime<Utc>, tz: &Timezone) -> Self {
        Self::from_date(tz.to_local(now).date_naive())
    }

    /// The current period in the given timezone
    pub fn current_in(tz: &Timezone) -> Self {
        Self::at(Utc::now(), tz)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The next calendar month, or `None` after `9999-12`
    pub fn checked_succ(&self) -> Option<Self> {
        match (self.year, self.month) {
            (9999, 12) => None,
            (year, 12) => Some(Self { year: year + 1, month: 1 }),
            (year, month) => Some(Self { year, month: month + 1 }),
        }
    }

    /// The previous calendar month, or `None` before `0001-01`
    pub fn checked_pred(&self) -> Option<Self> {
        match (self.year, self.month) {
            (1, 1) => None,
            (year, 1) => Some(Self { year: year - 1, month: 12 }),
            (year, month) => Some(Self { year, month: month - 1 }),
        }
    }

    /// The next calendar month; `9999-12` is its own successor
    pub fn succ(&self) -> Self {
        self.checked_succ().unwrap_or(Self::MAX)
    }

    /// The previous calendar month; `0001-01` is its own predecessor
    pub fn pred(&self) -> Self {
        self.checked_pred().unwrap_or(Self::MIN)
    }

    /// `count` consecutive periods starting at `start`
    ///
    /// Stops early at `9999-12`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_kernel::BillingPeriod;
    ///
    /// let start: BillingPeriod = "2025-11".parse().unwrap();
    /// let months: Vec<String> = BillingPeriod::range(start, 3)
    ///     .iter()
    ///     .map(|p| p.to_string())
    ///     .collect();
    /// assert_eq!(months, vec!["2025-11", "2025-12", "2026-01"]);
    /// ```
    pub fn range(start: BillingPeriod, count: usize) -> Vec<BillingPeriod> {
        std::iter::successors(Some(start), BillingPeriod::checked_succ)
            .take(count)
            .collect()
    }

    /// Human readable label, e.g. "February 2026"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(PeriodError::InvalidFormat(s.to_string()));
        }

        let year: i32 = s[..4]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        let month: u32 = s[5..]
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;

        Self::new(year, month)
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Timezone wrapper for the estate's local calendar
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// IANA name of the zone
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::Africa::Lagos)
    }
}

impl FromStr for Timezone {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| PeriodError::UnknownTimezone(s.to_string()))
    }
}

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
