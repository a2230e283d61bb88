use bon::bon;
use enumset::EnumSet;

use crate::{
    calendar::{DayRange, MonthDay, Weekday},
    prelude::*,
    schedule::DayPattern,
};

/// Day pattern applied over a date range on a subset of weekdays.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct Rule {
    day_pattern: DayPattern,
    weekdays: EnumSet<Weekday>,
    range: DayRange,

    /// Carried through the records only, holidays always resolve to the holiday pattern.
    applies_to_holidays: bool,
}

#[bon]
impl Rule {
    #[builder]
    pub fn new(
        day_pattern: DayPattern,
        #[builder(default)] weekdays: EnumSet<Weekday>,
        #[builder(default = MonthDay::JANUARY_1)] start_date: MonthDay,
        #[builder(default = MonthDay::DECEMBER_31)] end_date: MonthDay,
        #[builder(default)] applies_to_holidays: bool,
    ) -> Result<Self> {
        let range = DayRange::from_dates(start_date, end_date)?;
        Ok(Self { day_pattern, weekdays, range, applies_to_holidays })
    }
}

impl Rule {
    pub(crate) const fn with_range(
        day_pattern: DayPattern,
        weekdays: EnumSet<Weekday>,
        range: DayRange,
    ) -> Self {
        Self { day_pattern, weekdays, range, applies_to_holidays: false }
    }

    /// Rule from weekday names such as `"monday"` or `"Sat"`.
    pub fn from_days_applied(
        day_pattern: DayPattern,
        names: &[&str],
        start_date: MonthDay,
        end_date: MonthDay,
    ) -> Result<Self> {
        let weekdays = names.iter().map(|name| name.parse::<Weekday>()).collect::<Result<_>>()?;
        Self::builder()
            .day_pattern(day_pattern)
            .weekdays(weekdays)
            .start_date(start_date)
            .end_date(end_date)
            .build()
    }

    pub const fn day_pattern(&self) -> &DayPattern {
        &self.day_pattern
    }

    pub(crate) const fn day_pattern_mut(&mut self) -> &mut DayPattern {
        &mut self.day_pattern
    }

    pub fn into_day_pattern(self) -> DayPattern {
        self.day_pattern
    }

    pub const fn weekdays(&self) -> EnumSet<Weekday> {
        self.weekdays
    }

    pub const fn range(&self) -> DayRange {
        self.range
    }

    pub(crate) const fn set_range(&mut self, range: DayRange) {
        self.range = range;
    }

    pub fn start_date(&self) -> MonthDay {
        self.range.start_date()
    }

    pub fn end_date(&self) -> MonthDay {
        self.range.end_date()
    }

    pub fn set_dates(&mut self, start_date: MonthDay, end_date: MonthDay) -> Result {
        self.range = DayRange::from_dates(start_date, end_date)?;
        Ok(())
    }

    pub const fn applies_to_holidays(&self) -> bool {
        self.applies_to_holidays
    }

    pub const fn set_applies_to_holidays(&mut self, applies_to_holidays: bool) {
        self.applies_to_holidays = applies_to_holidays;
    }

    /// Whether the date range covers the day, ignoring weekdays.
    pub const fn covers(&self, day_of_year: u16, is_leap_year: bool) -> bool {
        self.range.contains(day_of_year, is_leap_year)
    }

    pub fn applies(&self, day_of_year: u16, weekday: Weekday, is_leap_year: bool) -> bool {
        self.weekdays.contains(weekday) && self.covers(day_of_year, is_leap_year)
    }

    /// Applicability per weekday, Sunday first.
    pub fn week_apply_tuple(&self) -> [bool; 7] {
        Weekday::ALL.map(|weekday| self.weekdays.contains(weekday))
    }

    pub fn days_applied(&self) -> Vec<Weekday> {
        self.weekdays.iter().collect()
    }

    pub fn is_applied_to_all_days(&self) -> bool {
        self.weekdays == EnumSet::all()
    }

    pub fn apply_day(&mut self, weekday: Weekday) {
        self.weekdays |= weekday;
    }

    /// Apply to a day of week numbered from 1 (Sunday) to 7 (Saturday).
    pub fn apply_day_by_dow(&mut self, dow: u8) -> Result {
        if !(1..=7).contains(&dow) {
            return Err(ValidationError::Weekday(dow.to_string()).into());
        }
        self.apply_day(Weekday::from_index(usize::from(dow - 1)));
        Ok(())
    }

    pub fn apply_day_by_name(&mut self, name: &str) -> Result {
        self.apply_day(name.parse()?);
        Ok(())
    }

    /// Monday to Friday.
    pub fn apply_weekday(&mut self) {
        self.weekdays |= Weekday::WORKING_DAYS;
    }

    pub fn apply_weekend(&mut self) {
        self.weekdays |= Weekday::WEEKEND;
    }

    pub fn apply_all(&mut self) {
        self.weekdays = EnumSet::all();
    }

    /// Copy with a detached day pattern.
    pub fn duplicate(&self) -> Self {
        Self { day_pattern: self.day_pattern.duplicate(), ..self.clone() }
    }
}
