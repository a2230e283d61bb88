use crate::{
    calendar::{DayRange, Weekday},
    schedule::{DayPattern, TypeLimit},
};

/// Named week: a day pattern identifier per weekday and per special day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekGroup {
    pub identifier: String,

    /// Sunday first.
    pub days: [String; 7],

    pub holiday: String,
    pub summer_design: String,
    pub winter_design: String,
}

impl WeekGroup {
    pub fn day(&self, weekday: Weekday) -> &str {
        &self.days[weekday.index()]
    }
}

/// Contiguous common-year days sharing a week group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekPeriod {
    pub week: String,
    pub range: DayRange,
}

/// Weekly schedule of a ruleset, the shape of the text export.
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklySchedule {
    pub identifier: String,
    pub type_limit: Option<TypeLimit>,

    /// Contiguous and covering the whole year.
    pub periods: Vec<WeekPeriod>,

    pub weeks: Vec<WeekGroup>,

    /// Identifier of the ruleset default, which also fills the custom days of the export.
    pub default_day_pattern: String,

    /// Detached copies of the default and every referenced day pattern.
    pub day_patterns: Vec<DayPattern>,
}

impl WeeklySchedule {
    pub fn week(&self, identifier: &str) -> Option<&WeekGroup> {
        self.weeks.iter().find(|week| week.identifier == identifier)
    }

    pub fn day_pattern(&self, identifier: &str) -> Option<&DayPattern> {
        self.day_patterns.iter().find(|pattern| pattern.identifier() == identifier)
    }
}

/// Compacted year: either a single value or weeks over date periods.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum YearSchedule {
    Constant { identifier: String, type_limit: Option<TypeLimit>, value: f64 },
    Weekly(WeeklySchedule),
}

impl YearSchedule {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Constant { identifier, .. } => identifier,
            Self::Weekly(schedule) => &schedule.identifier,
        }
    }

    pub const fn type_limit(&self) -> Option<&TypeLimit> {
        match self {
            Self::Constant { type_limit, .. } => type_limit.as_ref(),
            Self::Weekly(schedule) => schedule.type_limit.as_ref(),
        }
    }
}
