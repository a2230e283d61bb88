use std::{collections::HashMap, iter, str::FromStr};

use itertools::Itertools;

use crate::{
    calendar::{DayRange, MonthDay, Timestep},
    idf::Kind,
    prelude::*,
    schedule::{
        Breakpoint,
        DayPattern,
        NumericType,
        Ruleset,
        TypeLimit,
        UnitType,
        WeekGroup,
        WeekPeriod,
        WeeklySchedule,
        YearSchedule,
        library,
    },
};

/// Read every year and constant schedule of the text as a ruleset.
pub fn read_rulesets(text: &str) -> Result<Vec<Ruleset>> {
    read_year_schedules(text)?.iter().map(Ruleset::from_year_schedule).collect()
}

/// Read every `Schedule:Year` and `Schedule:Constant` of the text, in order of appearance.
///
/// Type limits are looked up in the text first and then in the built-in library. Objects of
/// unrelated types are skipped, and so are compact schedules, which are not supported.
#[instrument(skip_all)]
pub fn read_year_schedules(text: &str) -> Result<Vec<YearSchedule>> {
    let mut definitions = Definitions::default();
    let mut schedules = Vec::new();
    for object in Object::parse_all(text) {
        let Some(kind) = Kind::parse(&object.kind) else {
            debug!(kind = %object.kind, "skipping unrelated object");
            continue;
        };
        match kind {
            Kind::TypeLimits => definitions.type_limits.push(object.type_limit()?),
            Kind::DayInterval => definitions.day_patterns.push(object.day_interval()?),
            Kind::DayHourly => definitions.day_patterns.push(object.day_hourly()?),
            Kind::DayList => definitions.day_patterns.push(object.day_list()?),
            Kind::WeekDaily => {
                let (week, custom_day) = object.week_daily()?;
                definitions.weeks.insert(week.identifier.clone(), (week, custom_day));
            }
            Kind::Year | Kind::Constant => schedules.push((kind, object)),
            Kind::Compact => {
                warn!(identifier = ?object.fields.first(), "skipping unsupported compact schedule");
            }
        }
    }
    info!(
        n_schedules = schedules.len(),
        n_weeks = definitions.weeks.len(),
        n_day_patterns = definitions.day_patterns.len(),
        "read",
    );
    schedules
        .into_iter()
        .map(|(kind, object)| match kind {
            Kind::Constant => definitions.constant(&object),
            _ => definitions.year(&object),
        })
        .collect()
}

/// Objects referenced by year schedules.
#[derive(Default)]
struct Definitions {
    type_limits: Vec<TypeLimit>,
    day_patterns: Vec<DayPattern>,

    /// Week groups with their first custom day.
    weeks: HashMap<String, (WeekGroup, Option<String>)>,
}

impl Definitions {
    fn type_limit(&self, identifier: Option<&str>) -> Result<Option<TypeLimit>> {
        let Some(identifier) = identifier else {
            return Ok(None);
        };
        match self.type_limits.iter().find(|type_limit| type_limit.identifier() == identifier) {
            Some(type_limit) => Ok(Some(type_limit.clone())),
            None => Ok(Some(library::type_limit(identifier)?.clone())),
        }
    }

    fn constant(&self, object: &Object) -> Result<YearSchedule> {
        Ok(YearSchedule::Constant {
            identifier: object.field(0)?.to_owned(),
            type_limit: self.type_limit(object.optional(1))?,
            value: object.number(2)?,
        })
    }

    fn year(&self, object: &Object) -> Result<YearSchedule> {
        let identifier = object.field(0)?.to_owned();
        let type_limit = self.type_limit(object.optional(1))?;
        let periods = object.periods()?;

        let weeks = periods
            .iter()
            .map(|period| period.week.as_str())
            .unique()
            .map(|identifier| {
                self.weeks
                    .get(identifier)
                    .ok_or_else(|| LookupError::WeekSchedule(identifier.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let default_day_pattern = weeks
            .first()
            .map(|(week, custom_day)| custom_day.clone().unwrap_or_else(|| week.days[0].clone()))
            .unwrap_or_default();
        let day_patterns = iter::once(default_day_pattern.as_str())
            .chain(weeks.iter().flat_map(|(week, _)| {
                let special_days = [&week.holiday, &week.summer_design, &week.winter_design];
                week.days.iter().chain(special_days).map(String::as_str)
            }))
            .unique()
            .map(|identifier| {
                self.day_patterns
                    .iter()
                    .find(|pattern| pattern.identifier() == identifier)
                    .cloned()
                    .ok_or_else(|| LookupError::DayPattern(identifier.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(YearSchedule::Weekly(WeeklySchedule {
            identifier,
            type_limit,
            periods,
            weeks: weeks.into_iter().map(|(week, _)| week.clone()).collect(),
            default_day_pattern,
            day_patterns,
        }))
    }
}

/// Comma-separated fields of a single object, with comments stripped.
#[derive(Debug, PartialEq, Eq)]
struct Object {
    kind: String,
    fields: Vec<String>,
}

impl Object {
    fn parse_all(text: &str) -> Vec<Self> {
        let code =
            text.lines().map(|line| line.split_once('!').map_or(line, |(code, _)| code)).join("\n");
        code.split(';')
            .filter_map(|object| {
                let mut fields = object.split(',').map(|field| field.trim().to_owned());
                let kind = fields.next().filter(|kind| !kind.is_empty())?;
                Some(Self { kind, fields: fields.collect() })
            })
            .collect()
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let identifier = self.fields.first().map_or("", String::as_str);
        ValidationError::Syntax {
            record: format!("{}, {identifier}", self.kind),
            message: message.into(),
        }
        .into()
    }

    fn field(&self, index: usize) -> Result<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| self.syntax_error(format!("field {} is missing", index + 1)))
    }

    /// Blank and missing fields are absent.
    fn optional(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str).filter(|field| !field.is_empty())
    }

    fn number<T: FromStr>(&self, index: usize) -> Result<T> {
        let field = self.field(index)?;
        field.parse().map_err(|_| self.syntax_error(format!("`{field}` is not a number")))
    }

    /// Anything but `No` or a blank field turns interpolation on.
    fn interpolate(&self, index: usize) -> bool {
        self.optional(index).is_some_and(|field| !field.eq_ignore_ascii_case("no"))
    }

    fn type_limit(&self) -> Result<TypeLimit> {
        let limit = |index| self.optional(index).map(|_| self.number::<f64>(index)).transpose();
        TypeLimit::builder()
            .identifier(self.field(0)?)
            .maybe_lower_limit(limit(1)?)
            .maybe_upper_limit(limit(2)?)
            .maybe_numeric_type(self.optional(3).map(str::parse::<NumericType>).transpose()?)
            .maybe_unit_type(self.optional(4).map(str::parse::<UnitType>).transpose()?)
            .build()
    }

    /// Pairs of `until` time and value, the last one until `24:00`.
    fn day_interval(&self) -> Result<DayPattern> {
        let pairs = self.fields.get(3..).unwrap_or_default();
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(self.syntax_error("expected pairs of time and value"));
        }
        let mut breakpoints = Vec::with_capacity(pairs.len() / 2);
        let mut from = (0, 0);
        for index in (3..self.fields.len()).step_by(2) {
            breakpoints.push(Breakpoint::at(from.0, from.1, self.number(index + 1)?)?);
            from = self.time(index)?;
        }
        if from != (24, 0) {
            return Err(self.syntax_error("the last interval must end at 24:00"));
        }
        DayPattern::new(self.field(0)?, breakpoints, self.interpolate(2))
    }

    fn day_hourly(&self) -> Result<DayPattern> {
        let values =
            (2..self.fields.len()).map(|index| self.number(index)).collect::<Result<Vec<f64>>>()?;
        DayPattern::from_values_at_timestep(self.field(0)?, &values, Timestep::HOURLY, true)
    }

    fn day_list(&self) -> Result<DayPattern> {
        let interpolate = self.interpolate(2);
        let minutes: u32 = self.number(3)?;
        if minutes == 0 || 60 % minutes != 0 {
            let message = format!("{minutes} minutes per item do not divide an hour");
            return Err(self.syntax_error(message));
        }
        let values =
            (4..self.fields.len()).map(|index| self.number(index)).collect::<Result<Vec<f64>>>()?;
        let mut pattern = DayPattern::from_values_at_timestep(
            self.field(0)?,
            &values,
            Timestep::new(60 / minutes)?,
            !interpolate,
        )?;
        pattern.set_interpolate(interpolate);
        Ok(pattern)
    }

    /// `hh:mm`, optionally prefixed with `Until:`.
    fn time(&self, index: usize) -> Result<(u32, u32)> {
        let field = self.field(index)?;
        let time = field
            .get(..6)
            .filter(|prefix| prefix.eq_ignore_ascii_case("until:"))
            .map_or(field, |_| field[6..].trim());
        time.split_once(':')
            .and_then(|(hour, minute)| {
                Some((hour.trim().parse().ok()?, minute.trim().parse().ok()?))
            })
            .ok_or_else(|| self.syntax_error(format!("`{field}` is not a time")))
    }

    fn week_daily(&self) -> Result<(WeekGroup, Option<String>)> {
        let field = |index| self.field(index).map(str::to_owned);
        let week = WeekGroup {
            identifier: field(0)?,
            days: [field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?, field(7)?],
            holiday: field(8)?,
            summer_design: field(9)?,
            winter_design: field(10)?,
        };
        Ok((week, self.optional(11).map(str::to_owned)))
    }

    /// Week periods of a year, which must cover it without gaps or overlaps.
    ///
    /// February 29 is part of the range containing February 28.
    fn periods(&self) -> Result<Vec<WeekPeriod>> {
        let fields = self.fields.get(2..).unwrap_or_default();
        if fields.is_empty() || fields.len() % 5 != 0 {
            return Err(self.syntax_error("expected groups of week, start date and end date"));
        }
        let mut periods = (2..self.fields.len())
            .step_by(5)
            .map(|index| {
                let date = |offset: usize| {
                    MonthDay::new(self.number(index + offset)?, self.number(index + offset + 1)?)
                };
                let (start, end) = (date(1)?, date(3)?);
                let start = if start.is_leap_day() { MonthDay::new(3, 1)? } else { start };
                let end = if end.is_leap_day() { MonthDay::new(2, 28)? } else { end };
                let range = DayRange::from_dates(start, end)?;
                Ok(WeekPeriod { week: self.field(index)?.to_owned(), range })
            })
            .collect::<Result<Vec<_>>>()?;
        periods.sort_by_key(|period| period.range.start());

        let mut next_day = DayRange::FULL_YEAR.start();
        for period in &periods {
            if period.range.start() != next_day {
                return Err(self.syntax_error(format!("periods do not meet at {}", period.range)));
            }
            next_day = period.range.end() + 1;
        }
        if next_day != DayRange::FULL_YEAR.end() + 1 {
            return Err(self.syntax_error("periods do not reach the end of the year"));
        }
        Ok(periods)
    }
}
