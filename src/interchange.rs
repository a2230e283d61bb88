//! JSON records of rulesets, full and abridged.

use std::collections::HashMap;

use chrono::Timelike;
use enumset::EnumSet;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    calendar::{MonthDay, Weekday},
    prelude::*,
    schedule::{Breakpoint, DayPattern, NumericType, Rule, Ruleset, TypeLimit, UnitType, library},
};

/// Top-level schedule record, discriminated by its `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScheduleRecord {
    /// Type limit inlined.
    ScheduleRuleset(RulesetRecord<TypeLimitRecord>),

    /// Type limit referenced by identifier.
    ScheduleRulesetAbridged(RulesetRecord<String>),
}

impl ScheduleRecord {
    pub fn from_ruleset(ruleset: &Ruleset, is_abridged: bool) -> Self {
        let type_limit = ruleset.type_limit();
        if is_abridged {
            let identifier = type_limit.map(|type_limit| type_limit.identifier().to_owned());
            Self::ScheduleRulesetAbridged(RulesetRecord::new(ruleset, identifier))
        } else {
            Self::ScheduleRuleset(RulesetRecord::new(ruleset, type_limit.map(TypeLimitRecord::from)))
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::ScheduleRuleset(record) => &record.identifier,
            Self::ScheduleRulesetAbridged(record) => &record.identifier,
        }
    }

    /// Build the ruleset, resolving an abridged type limit against the table
    /// and then against the built-in library.
    pub fn into_ruleset(self, type_limits: &[TypeLimit]) -> Result<Ruleset> {
        match self {
            Self::ScheduleRuleset(mut record) => {
                let type_limit =
                    record.schedule_type_limit.take().map(TypeLimit::try_from).transpose()?;
                record.into_ruleset(type_limit)
            }
            Self::ScheduleRulesetAbridged(record) => {
                let type_limit = record
                    .schedule_type_limit
                    .as_deref()
                    .map(|identifier| {
                        type_limits
                            .iter()
                            .find(|type_limit| type_limit.identifier() == identifier)
                            .map_or_else(|| library::type_limit(identifier), Ok)
                            .cloned()
                    })
                    .transpose()?;
                record.into_ruleset(type_limit)
            }
        }
    }
}

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulesetRecord<L> {
    pub identifier: String,
    pub display_name: Option<String>,
    pub day_schedules: Vec<DayRecord>,
    pub default_day_schedule: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule_rules: Vec<RuleRecord>,

    pub holiday_schedule: Option<String>,
    pub summer_designday_schedule: Option<String>,
    pub winter_designday_schedule: Option<String>,
    pub schedule_type_limit: Option<L>,
}

impl<L> RulesetRecord<L> {
    fn new(ruleset: &Ruleset, schedule_type_limit: Option<L>) -> Self {
        let identifier = |pattern: &DayPattern| pattern.identifier().to_owned();
        Self {
            identifier: ruleset.identifier().to_owned(),
            display_name: ruleset.explicit_display_name().map(str::to_owned),
            day_schedules: ruleset.day_patterns().into_iter().map(DayRecord::from).collect(),
            default_day_schedule: identifier(ruleset.default_day_pattern()),
            schedule_rules: ruleset.rules().iter().map(RuleRecord::from).collect(),
            holiday_schedule: ruleset.holiday_pattern().map(identifier),
            summer_designday_schedule: ruleset.summer_design_pattern().map(identifier),
            winter_designday_schedule: ruleset.winter_design_pattern().map(identifier),
            schedule_type_limit,
        }
    }

    fn into_ruleset(self, type_limit: Option<TypeLimit>) -> Result<Ruleset> {
        let day_patterns = self
            .day_schedules
            .into_iter()
            .map(|record| Ok((record.identifier.clone(), DayPattern::try_from(record)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        let day_pattern = |identifier: &str| {
            day_patterns
                .get(identifier)
                .cloned()
                .ok_or_else(|| LookupError::DayPattern(identifier.to_owned()))
        };
        let rules = self
            .schedule_rules
            .into_iter()
            .map(|record| {
                Rule::builder()
                    .day_pattern(day_pattern(&record.schedule_day)?)
                    .weekdays(record.weekdays())
                    .start_date(record.start_date)
                    .end_date(record.end_date)
                    .applies_to_holidays(record.apply_holiday)
                    .build()
            })
            .collect::<Result<Vec<_>>>()?;
        Ruleset::builder()
            .identifier(self.identifier)
            .maybe_display_name(self.display_name)
            .default_day_pattern(day_pattern(&self.default_day_schedule)?)
            .rules(rules)
            .maybe_type_limit(type_limit)
            .maybe_holiday_pattern(self.holiday_schedule.as_deref().map(day_pattern).transpose()?)
            .maybe_summer_design_pattern(
                self.summer_designday_schedule.as_deref().map(day_pattern).transpose()?,
            )
            .maybe_winter_design_pattern(
                self.winter_designday_schedule.as_deref().map(day_pattern).transpose()?,
            )
            .build()
    }
}

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "ScheduleDay")]
pub struct DayRecord {
    pub identifier: String,
    pub display_name: Option<String>,
    pub values: Vec<f64>,

    /// `[hour, minute]` of every value, midnight alone when omitted.
    #[serde(default)]
    pub times: Vec<[u32; 2]>,

    #[serde(default)]
    pub interpolate: bool,
}

impl From<&DayPattern> for DayRecord {
    fn from(pattern: &DayPattern) -> Self {
        Self {
            identifier: pattern.identifier().to_owned(),
            display_name: pattern.explicit_display_name().map(str::to_owned),
            values: pattern.values().collect(),
            times: pattern
                .breakpoints()
                .iter()
                .map(|breakpoint| [breakpoint.time.hour(), breakpoint.time.minute()])
                .collect(),
            interpolate: pattern.interpolate(),
        }
    }
}

impl TryFrom<DayRecord> for DayPattern {
    type Error = Error;

    fn try_from(record: DayRecord) -> Result<Self> {
        let times = if record.times.is_empty() { vec![[0, 0]] } else { record.times };
        if times.len() != record.values.len() {
            return Err(ValidationError::ValueCount {
                expected: times.len(),
                actual: record.values.len(),
            }
            .into());
        }
        let breakpoints = times
            .into_iter()
            .zip(record.values)
            .map(|([hour, minute], value)| Breakpoint::at(hour, minute, value))
            .collect::<Result<Vec<_>>>()?;
        let mut pattern = Self::new(record.identifier, breakpoints, record.interpolate)?;
        pattern.set_display_name(record.display_name);
        Ok(pattern)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "ScheduleRuleAbridged")]
pub struct RuleRecord {
    pub schedule_day: String,

    #[serde(default)]
    pub apply_sunday: bool,

    #[serde(default)]
    pub apply_monday: bool,

    #[serde(default)]
    pub apply_tuesday: bool,

    #[serde(default)]
    pub apply_wednesday: bool,

    #[serde(default)]
    pub apply_thursday: bool,

    #[serde(default)]
    pub apply_friday: bool,

    #[serde(default)]
    pub apply_saturday: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub apply_holiday: bool,

    /// `[month, day]`
    #[serde(default = "january_1")]
    pub start_date: MonthDay,

    #[serde(default = "december_31")]
    pub end_date: MonthDay,
}

impl RuleRecord {
    pub fn weekdays(&self) -> EnumSet<Weekday> {
        [
            self.apply_sunday,
            self.apply_monday,
            self.apply_tuesday,
            self.apply_wednesday,
            self.apply_thursday,
            self.apply_friday,
            self.apply_saturday,
        ]
        .into_iter()
        .zip(Weekday::ALL)
        .filter_map(|(is_applied, weekday)| is_applied.then_some(weekday))
        .collect()
    }
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        let [
            apply_sunday,
            apply_monday,
            apply_tuesday,
            apply_wednesday,
            apply_thursday,
            apply_friday,
            apply_saturday,
        ] = rule.week_apply_tuple();
        Self {
            schedule_day: rule.day_pattern().identifier().to_owned(),
            apply_sunday,
            apply_monday,
            apply_tuesday,
            apply_wednesday,
            apply_thursday,
            apply_friday,
            apply_saturday,
            apply_holiday: rule.applies_to_holidays(),
            start_date: rule.start_date(),
            end_date: rule.end_date(),
        }
    }
}

const fn january_1() -> MonthDay {
    MonthDay::JANUARY_1
}

const fn december_31() -> MonthDay {
    MonthDay::DECEMBER_31
}

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "ScheduleTypeLimit")]
pub struct TypeLimitRecord {
    pub identifier: String,
    pub display_name: Option<String>,

    #[serde(default)]
    pub lower_limit: Limit,

    #[serde(default)]
    pub upper_limit: Limit,

    #[serde(default)]
    pub numeric_type: NumericType,

    #[serde(default)]
    pub unit_type: UnitType,
}

impl From<&TypeLimit> for TypeLimitRecord {
    fn from(type_limit: &TypeLimit) -> Self {
        Self {
            identifier: type_limit.identifier().to_owned(),
            display_name: type_limit.explicit_display_name().map(str::to_owned),
            lower_limit: type_limit.lower_limit().into(),
            upper_limit: type_limit.upper_limit().into(),
            numeric_type: type_limit.numeric_type(),
            unit_type: type_limit.unit_type(),
        }
    }
}

impl TryFrom<TypeLimitRecord> for TypeLimit {
    type Error = Error;

    fn try_from(record: TypeLimitRecord) -> Result<Self> {
        Self::builder()
            .identifier(record.identifier)
            .maybe_display_name(record.display_name)
            .maybe_lower_limit(record.lower_limit.into())
            .maybe_upper_limit(record.upper_limit.into())
            .numeric_type(record.numeric_type)
            .unit_type(record.unit_type)
            .build()
    }
}

/// Bound of a type limit: a number or `{"type": "NoLimit"}`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LimitRepr", into = "LimitRepr")]
pub enum Limit {
    Value(f64),

    #[default]
    NoLimit,
}

#[derive(Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LimitRepr {
    Value(f64),
    Tagged(LimitTag),
}

#[derive(Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum LimitTag {
    NoLimit,
}

impl From<LimitRepr> for Limit {
    fn from(repr: LimitRepr) -> Self {
        match repr {
            LimitRepr::Value(value) => Self::Value(value),
            LimitRepr::Tagged(LimitTag::NoLimit) => Self::NoLimit,
        }
    }
}

impl From<Limit> for LimitRepr {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Value(value) => Self::Value(value),
            Limit::NoLimit => Self::Tagged(LimitTag::NoLimit),
        }
    }
}

impl From<Option<f64>> for Limit {
    fn from(limit: Option<f64>) -> Self {
        limit.map_or(Self::NoLimit, Self::Value)
    }
}

impl From<Limit> for Option<f64> {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Value(value) => Some(value),
            Limit::NoLimit => None,
        }
    }
}
