use std::{collections::HashMap, iter};

use enumset::EnumSet;
use itertools::Itertools;

use crate::{
    calendar::{DayRange, Weekday},
    prelude::*,
    schedule::{
        DayPattern,
        Rule,
        Ruleset,
        WeekGroup,
        WeekPeriod,
        WeeklySchedule,
        YearSchedule,
        ruleset::Week,
    },
};

impl Ruleset {
    /// Compact the ruleset into week groups over contiguous date periods.
    ///
    /// Each distinct set of active rules yields a week, identical weeks are merged, and
    /// consecutive days of the same week form a period.
    #[instrument(skip_all, fields(identifier = self.identifier()))]
    pub fn to_year_schedule(&self) -> YearSchedule {
        if self.is_constant() {
            return YearSchedule::Constant {
                identifier: self.identifier().to_owned(),
                type_limit: self.type_limit().cloned(),
                value: self.default_day_pattern().breakpoints()[0].value,
            };
        }

        let (weeks, assignment) = if self.is_single_week() {
            let all_rules = (0..self.len()).collect_vec();
            (vec![self.week(&all_rules)], vec![0; usize::from(DayRange::FULL_YEAR.end())])
        } else {
            let mut weeks: Vec<Week<'_>> = Vec::new();
            let mut week_of_rules: HashMap<Vec<usize>, usize> = HashMap::new();
            let assignment = self
                .active_rules_by_day()
                .into_iter()
                .map(|active_rules| {
                    *week_of_rules.entry(active_rules).or_insert_with_key(|active_rules| {
                        let week = self.week(active_rules);
                        weeks.iter().position(|known| known.key() == week.key()).unwrap_or_else(|| {
                            weeks.push(week);
                            weeks.len() - 1
                        })
                    })
                })
                .collect_vec();
            (weeks, assignment)
        };

        let week_identifier = |index: usize| format!("{}_Week {}", self.identifier(), index + 1);
        let periods = contiguous_ranges(&assignment)
            .into_iter()
            .map(|(index, range)| WeekPeriod { week: week_identifier(index), range })
            .collect_vec();
        info!(n_weeks = weeks.len(), n_periods = periods.len(), "compacted");

        let day_patterns = iter::once(self.default_day_pattern())
            .chain(weeks.iter().flat_map(|week| {
                week.days.iter().copied().chain([week.holiday, week.summer_design, week.winter_design])
            }))
            .unique_by(|pattern| pattern.identifier())
            .map(DayPattern::duplicate)
            .collect();
        let weeks = weeks
            .iter()
            .enumerate()
            .map(|(index, week)| WeekGroup {
                identifier: week_identifier(index),
                days: week.days.map(|pattern| pattern.identifier().to_owned()),
                holiday: week.holiday.identifier().to_owned(),
                summer_design: week.summer_design.identifier().to_owned(),
                winter_design: week.winter_design.identifier().to_owned(),
            })
            .collect();
        YearSchedule::Weekly(WeeklySchedule {
            identifier: self.identifier().to_owned(),
            type_limit: self.type_limit().cloned(),
            periods,
            weeks,
            default_day_pattern: self.default_day_pattern().identifier().to_owned(),
            day_patterns,
        })
    }

    /// Rebuild a ruleset from a compacted year, resolving to the same values.
    ///
    /// Every period yields one rule per distinct weekday pattern, the pattern of the very
    /// first rule becomes the default. The holiday pattern is dropped when it is the default.
    #[instrument(skip_all, fields(identifier = schedule.identifier()))]
    pub fn from_year_schedule(schedule: &YearSchedule) -> Result<Self> {
        let schedule = match schedule {
            YearSchedule::Constant { identifier, type_limit, value } => {
                return Self::from_constant_value(identifier.as_str(), *value, type_limit.clone());
            }
            YearSchedule::Weekly(schedule) => schedule,
        };
        let day_pattern = |identifier: &str| {
            schedule
                .day_pattern(identifier)
                .map(DayPattern::duplicate)
                .ok_or_else(|| LookupError::DayPattern(identifier.to_owned()))
        };
        let periods = schedule
            .periods
            .iter()
            .map(|period| {
                let week = schedule
                    .week(&period.week)
                    .ok_or_else(|| LookupError::WeekSchedule(period.week.clone()))?;
                Ok((week, period.range))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rules = Vec::new();
        for (week, range) in &periods {
            for (identifier, weekdays) in weekdays_by_pattern(week) {
                rules.push(Rule::with_range(day_pattern(identifier)?, weekdays, *range));
            }
        }
        let mut rules = rules.into_iter();
        let default_day_pattern = match rules.next() {
            Some(rule) => rule.into_day_pattern(),
            None => return Err(LookupError::WeekSchedule(schedule.identifier.clone()).into()),
        };
        let rules = rules.collect_vec();

        // Special days do not vary over the year in a ruleset, the first week decides:
        let first_week = periods.first().map(|(week, _)| *week);
        if periods.iter().map(|(week, _)| week.holiday.as_str()).unique().nth(1).is_some() {
            warn!(
                identifier = %schedule.identifier,
                "holidays differ between the weeks, keeping the first one…",
            );
        }
        let holiday_pattern = first_week
            .map(|week| week.holiday.as_str())
            .filter(|holiday| *holiday != default_day_pattern.identifier())
            .map(day_pattern)
            .transpose()?;
        Self::builder()
            .identifier(schedule.identifier.as_str())
            .default_day_pattern(default_day_pattern)
            .rules(rules)
            .maybe_type_limit(schedule.type_limit.clone())
            .maybe_holiday_pattern(holiday_pattern)
            .maybe_summer_design_pattern(first_week.map(|week| day_pattern(&week.summer_design)).transpose()?)
            .maybe_winter_design_pattern(first_week.map(|week| day_pattern(&week.winter_design)).transpose()?)
            .build()
    }
}

/// Consecutive days sharing the same item, as `(item, range)` pairs.
pub(crate) fn contiguous_ranges(items_by_day: &[usize]) -> Vec<(usize, DayRange)> {
    let chunks = items_by_day.iter().copied().zip(1_u16..).chunk_by(|(item, _)| *item);
    chunks
        .into_iter()
        .map(|(item, days)| {
            let days = days.map(|(_, day)| day).collect_vec();
            (item, DayRange::spanning(days[0], days[days.len() - 1]))
        })
        .collect()
}

/// Distinct day patterns of a week, in order of the first weekday using each.
fn weekdays_by_pattern(week: &WeekGroup) -> Vec<(&str, EnumSet<Weekday>)> {
    let mut grouped: Vec<(&str, EnumSet<Weekday>)> = Vec::new();
    for weekday in Weekday::ALL {
        let identifier = week.day(weekday);
        match grouped.iter_mut().find(|(known, _)| *known == identifier) {
            Some((_, weekdays)) => *weekdays |= weekday,
            None => grouped.push((identifier, EnumSet::only(weekday))),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calendar::{MonthDay, Timestep},
        schedule::ruleset::tests::office_day,
    };

    fn seasonal_office() -> Result<Ruleset> {
        Ruleset::builder()
            .identifier("Seasonal Office")
            .default_day_pattern(DayPattern::constant("Closed", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(office_day("Summer Hours", 0.5))
                    .weekdays(Weekday::WORKING_DAYS)
                    .start_date(MonthDay::new(6, 1)?)
                    .end_date(MonthDay::new(8, 31)?)
                    .build()?,
                Rule::builder()
                    .day_pattern(office_day("Office Hours", 1.0))
                    .weekdays(Weekday::WORKING_DAYS)
                    .build()?,
                Rule::builder()
                    .day_pattern(office_day("Saturday Hours", 0.25))
                    .weekdays(EnumSet::only(Weekday::Saturday))
                    .start_date(MonthDay::new(11, 15)?)
                    .end_date(MonthDay::new(12, 24)?)
                    .applies_to_holidays(true)
                    .build()?,
            ])
            .summer_design_pattern(office_day("Summer Design", 1.0))
            .build()
    }

    #[test]
    fn compacts_into_weeks() -> Result {
        let YearSchedule::Weekly(schedule) = seasonal_office()?.to_year_schedule() else {
            panic!("the schedule is not constant");
        };
        assert_eq!(schedule.weeks.len(), 3);
        let ranges = schedule
            .periods
            .iter()
            .map(|period| (period.week.as_str(), period.range.to_string()))
            .collect_vec();
        assert_eq!(
            ranges,
            [
                ("Seasonal Office_Week 1", "Jan 01 – May 31".to_string()),
                ("Seasonal Office_Week 2", "Jun 01 – Aug 31".to_string()),
                ("Seasonal Office_Week 1", "Sep 01 – Nov 14".to_string()),
                ("Seasonal Office_Week 3", "Nov 15 – Dec 24".to_string()),
                ("Seasonal Office_Week 1", "Dec 25 – Dec 31".to_string()),
            ],
        );
        let third = &schedule.weeks[2];
        assert_eq!(third.day(Weekday::Saturday), "Saturday Hours");
        assert_eq!(third.holiday, "Closed");
        assert_eq!(third.summer_design, "Summer Design");
        assert_eq!(third.winter_design, "Closed");
        assert_eq!(schedule.weeks[0].holiday, "Closed");
        assert_eq!(schedule.day_patterns.len(), 5);
        Ok(())
    }

    #[test]
    fn single_week_ok() -> Result {
        let ruleset = Ruleset::builder()
            .identifier("Weekly")
            .default_day_pattern(DayPattern::constant("Closed", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(office_day("Open", 1.0))
                    .weekdays(Weekday::WORKING_DAYS)
                    .build()?,
            ])
            .build()?;
        let YearSchedule::Weekly(schedule) = ruleset.to_year_schedule() else {
            panic!("the schedule is not constant");
        };
        assert_eq!(schedule.weeks.len(), 1);
        assert_eq!(schedule.periods.len(), 1);
        assert!(schedule.periods[0].range.is_full_year());
        Ok(())
    }

    #[test]
    fn constant_ok() -> Result {
        let ruleset = Ruleset::from_constant_value("Always", 0.75, None)?;
        assert_eq!(
            ruleset.to_year_schedule(),
            YearSchedule::Constant { identifier: "Always".into(), type_limit: None, value: 0.75 },
        );
        let restored = Ruleset::from_year_schedule(&ruleset.to_year_schedule())?;
        assert_eq!(restored.values().call()?, ruleset.values().call()?);
        Ok(())
    }

    /// Resolution must not change across every alignment of the calendar.
    fn assert_same_values(original: &Ruleset, restored: &Ruleset) -> Result {
        let holidays =
            [MonthDay::JANUARY_1, MonthDay::new(2, 28)?, MonthDay::new(7, 4)?, MonthDay::new(12, 25)?];
        for is_leap_year in [false, true] {
            for start_weekday in Weekday::ALL {
                for holidays in [&[][..], &holidays[..]] {
                    let values = |ruleset: &Ruleset| {
                        ruleset
                            .values()
                            .timestep(Timestep::new(2)?)
                            .start_weekday(start_weekday)
                            .holidays(holidays)
                            .is_leap_year(is_leap_year)
                            .call()
                    };
                    assert_eq!(
                        values(restored)?,
                        values(original)?,
                        "{start_weekday} leap={is_leap_year}",
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn round_trip_ok() -> Result {
        let original = seasonal_office()?;
        let restored = Ruleset::from_year_schedule(&original.to_year_schedule())?;
        assert_same_values(&original, &restored)?;

        // Holidays fall back to the default day in every week:
        assert!(restored.holiday_pattern().is_none());
        assert!(restored.rules().iter().all(|rule| !rule.weekdays().is_empty()));
        assert_eq!(restored.summer_design_pattern().map(DayPattern::identifier), Some("Summer Design"));
        Ok(())
    }

    #[test]
    fn round_trip_with_holiday_pattern_ok() -> Result {
        let mut original = seasonal_office()?;
        original.set_holiday_pattern(Some(DayPattern::constant("Holiday", 0.1)?))?;
        let restored = Ruleset::from_year_schedule(&original.to_year_schedule())?;
        assert_same_values(&original, &restored)?;
        assert_eq!(restored.holiday_pattern().map(DayPattern::identifier), Some("Holiday"));
        Ok(())
    }

    #[test]
    fn round_trip_around_leap_day_ok() -> Result {
        let original = Ruleset::builder()
            .identifier("February")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(office_day("Late February", 1.0))
                    .weekdays(EnumSet::all())
                    .start_date(MonthDay::new(2, 20)?)
                    .end_date(MonthDay::new(2, 28)?)
                    .build()?,
                Rule::builder()
                    .day_pattern(office_day("Early March", 0.5))
                    .weekdays(Weekday::WEEKEND)
                    .start_date(MonthDay::new(3, 1)?)
                    .end_date(MonthDay::new(3, 10)?)
                    .build()?,
            ])
            .build()?;
        let restored = Ruleset::from_year_schedule(&original.to_year_schedule())?;
        assert_same_values(&original, &restored)
    }

    #[test]
    fn rejects_unknown_references() -> Result {
        let YearSchedule::Weekly(mut schedule) = seasonal_office()?.to_year_schedule() else {
            panic!("the schedule is not constant");
        };
        schedule.day_patterns.retain(|pattern| pattern.identifier() != "Closed");
        assert_eq!(
            Ruleset::from_year_schedule(&YearSchedule::Weekly(schedule.clone())),
            Err(Error::from(LookupError::DayPattern("Closed".into()))),
        );
        schedule.weeks.clear();
        assert!(matches!(
            Ruleset::from_year_schedule(&YearSchedule::Weekly(schedule)),
            Err(Error::Lookup(LookupError::WeekSchedule(_))),
        ));
        Ok(())
    }
}
