//! Day-of-year arithmetic over a common (365-day) or a leap (366-day) year.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use enumset::{EnumSet, enum_set};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Reference years used to map month-day pairs onto day-of-year numbers.
const COMMON_YEAR: i32 = 2017;
const LEAP_YEAR: i32 = 2016;

pub const DAYS_IN_COMMON_YEAR: u16 = 365;

const FEBRUARY_28: u16 = 59;
const MARCH_1: u16 = 60;

pub const fn days_in_year(is_leap_year: bool) -> u16 {
    if is_leap_year { DAYS_IN_COMMON_YEAR + 1 } else { DAYS_IN_COMMON_YEAR }
}

#[derive(Debug, clap::ValueEnum, enumset::EnumSetType, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Weekdays in the order of the weekly export records.
    pub const ALL: [Self; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    pub const WORKING_DAYS: EnumSet<Self> = enum_set!(
        Weekday::Monday | Weekday::Tuesday | Weekday::Wednesday | Weekday::Thursday | Weekday::Friday
    );

    pub const WEEKEND: EnumSet<Self> = enum_set!(Weekday::Saturday | Weekday::Sunday);

    /// Zero-based position, Sunday first.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }

    /// Weekday of the given day of year in a year which starts on `self`.
    pub const fn of_day(self, day_of_year: u16) -> Self {
        Self::from_index(self.index() + day_of_year as usize + 6)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let lowercase = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|weekday| {
                let name = weekday.name().to_lowercase();
                name == lowercase || name[..3] == lowercase
            })
            .ok_or_else(|| ValidationError::Weekday(s.to_owned()).into())
    }
}

/// Calendar date without a year.
///
/// February 29 is a valid value, whether it exists depends on the year it is projected onto.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
#[must_use]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub const JANUARY_1: Self = Self { month: 1, day: 1 };
    pub const DECEMBER_31: Self = Self { month: 12, day: 31 };

    pub fn new(month: u32, day: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(LEAP_YEAR, month, day).is_none() {
            return Err(ValidationError::Date { month, day }.into());
        }
        Ok(Self { month, day })
    }

    pub const fn month(self) -> u32 {
        self.month
    }

    pub const fn day(self) -> u32 {
        self.day
    }

    pub const fn is_leap_day(self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// Fails for February 29 in a common year.
    pub fn day_of_year(self, is_leap_year: bool) -> Result<u16> {
        let year = if is_leap_year { LEAP_YEAR } else { COMMON_YEAR };
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .and_then(|date| u16::try_from(date.ordinal()).ok())
            .ok_or_else(|| ValidationError::Date { month: self.month, day: self.day }.into())
    }

    pub fn from_day_of_year(day_of_year: u16, is_leap_year: bool) -> Result<Self> {
        let year = if is_leap_year { LEAP_YEAR } else { COMMON_YEAR };
        let date = NaiveDate::from_yo_opt(year, u32::from(day_of_year))
            .ok_or(ValidationError::DayOfYear(day_of_year))?;
        Ok(Self { month: date.month(), day: date.day() })
    }

    /// Date of an already validated common-year day.
    fn of_common_day(day_of_year: u16) -> Self {
        NaiveDate::from_yo_opt(COMMON_YEAR, u32::from(day_of_year))
            .map_or(Self::DECEMBER_31, |date| Self { month: date.month(), day: date.day() })
    }
}

impl TryFrom<(u32, u32)> for MonthDay {
    type Error = Error;

    fn try_from((month, day): (u32, u32)) -> Result<Self> {
        Self::new(month, day)
    }
}

impl From<MonthDay> for (u32, u32) {
    fn from(date: MonthDay) -> Self {
        (date.month, date.day)
    }
}

impl Display for MonthDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match NaiveDate::from_ymd_opt(LEAP_YEAR, self.month, self.day) {
            Some(date) => write!(f, "{}", date.format("%b %d")),
            None => write!(f, "{}/{}", self.month, self.day),
        }
    }
}

impl FromStr for MonthDay {
    type Err = Error;

    /// Parses `month/day`, for example `12/25`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || ValidationError::Syntax { record: "date".into(), message: s.into() };
        let (month, day) = s.trim().split_once('/').ok_or_else(malformed)?;
        let month = month.trim().parse().map_err(|_| malformed())?;
        let day = day.trim().parse().map_err(|_| malformed())?;
        Self::new(month, day)
    }
}

/// Inclusive range of common-year days, `1..=365`.
///
/// In a leap year the range keeps its civil dates, and February 29 belongs to the range
/// if and only if February 28 does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct DayRange {
    start: u16,
    end: u16,
}

impl DayRange {
    pub const FULL_YEAR: Self = Self { start: 1, end: DAYS_IN_COMMON_YEAR };

    pub fn new(start: u16, end: u16) -> Result<Self> {
        for day in [start, end] {
            if !(1..=DAYS_IN_COMMON_YEAR).contains(&day) {
                return Err(ValidationError::DayOfYear(day).into());
            }
        }
        if start > end {
            return Err(ValidationError::DateOrder {
                start: MonthDay::of_common_day(start),
                end: MonthDay::of_common_day(end),
            }
            .into());
        }
        Ok(Self { start, end })
    }

    /// Range between already validated common-year days.
    pub(crate) const fn spanning(start: u16, end: u16) -> Self {
        debug_assert!(1 <= start && start <= end && end <= DAYS_IN_COMMON_YEAR);
        Self { start, end }
    }

    pub fn from_dates(start: MonthDay, end: MonthDay) -> Result<Self> {
        for date in [start, end] {
            if date.is_leap_day() {
                return Err(ValidationError::LeapDayBoundary(date).into());
            }
        }
        Self::new(start.day_of_year(false)?, end.day_of_year(false)?)
    }

    pub const fn start(self) -> u16 {
        self.start
    }

    pub const fn end(self) -> u16 {
        self.end
    }

    pub fn start_date(self) -> MonthDay {
        MonthDay::of_common_day(self.start)
    }

    pub fn end_date(self) -> MonthDay {
        MonthDay::of_common_day(self.end)
    }

    pub const fn is_full_year(self) -> bool {
        self.start == 1 && self.end == DAYS_IN_COMMON_YEAR
    }

    pub const fn contains(self, day_of_year: u16, is_leap_year: bool) -> bool {
        let (start, end) = if is_leap_year {
            (
                if self.start >= MARCH_1 { self.start + 1 } else { self.start },
                if self.end >= FEBRUARY_28 { self.end + 1 } else { self.end },
            )
        } else {
            (self.start, self.end)
        };
        start <= day_of_year && day_of_year <= end
    }

    pub fn intersection(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    pub const fn covers(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Display for DayRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} – {}", self.start_date(), self.end_date())
    }
}

/// Number of values per hour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[must_use]
pub struct Timestep(u32);

impl Timestep {
    pub const HOURLY: Self = Self(1);

    const SUPPORTED: [u32; 12] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60];

    pub fn new(steps_per_hour: u32) -> Result<Self> {
        if Self::SUPPORTED.contains(&steps_per_hour) {
            Ok(Self(steps_per_hour))
        } else {
            Err(ValidationError::Timestep(steps_per_hour).into())
        }
    }

    pub const fn steps_per_hour(self) -> u32 {
        self.0
    }

    pub const fn minutes(self) -> u32 {
        60 / self.0
    }

    pub const fn steps_per_day(self) -> usize {
        24 * self.0 as usize
    }
}

impl Default for Timestep {
    fn default() -> Self {
        Self::HOURLY
    }
}

impl TryFrom<u32> for Timestep {
    type Error = Error;

    fn try_from(steps_per_hour: u32) -> Result<Self> {
        Self::new(steps_per_hour)
    }
}

impl From<Timestep> for u32 {
    fn from(timestep: Timestep) -> Self {
        timestep.0
    }
}

impl FromStr for Timestep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let steps_per_hour = s.trim().parse().map_err(|_| ValidationError::Syntax {
            record: "timestep".into(),
            message: s.into(),
        })?;
        Self::new(steps_per_hour)
    }
}
