use bon::bon;
use enumset::EnumSet;
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{
    calendar::{DayRange, Timestep, Weekday},
    prelude::*,
    schedule::{DayPattern, Rule, Ruleset, TypeLimit},
};

#[bon]
impl Ruleset {
    /// Same value all year round.
    pub fn from_constant_value(
        identifier: impl Into<String>,
        value: f64,
        type_limit: Option<TypeLimit>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let day_pattern = DayPattern::constant(format!("{identifier}_Day Schedule"), value)?;
        Self::builder()
            .identifier(identifier)
            .default_day_pattern(day_pattern)
            .maybe_type_limit(type_limit)
            .build()
    }

    /// Same day all year round, from evenly spaced values.
    pub fn from_daily_values(
        identifier: impl Into<String>,
        values: &[f64],
        timestep: Timestep,
        type_limit: Option<TypeLimit>,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let day_pattern = DayPattern::from_values_at_timestep(
            format!("{identifier}_Day Schedule"),
            values,
            timestep,
            true,
        )?;
        Self::builder()
            .identifier(identifier)
            .default_day_pattern(day_pattern)
            .maybe_type_limit(type_limit)
            .build()
    }

    /// Single-week ruleset from evenly spaced values per weekday, Sunday first.
    ///
    /// Identical weekdays share a rule. Without explicit design days, the summer one is the
    /// weekday of the highest mean and the winter one is the weekday of the lowest mean.
    #[builder]
    pub fn from_week_daily_values(
        #[builder(into)] identifier: String,
        week_values: [Vec<f64>; 7],
        holiday_values: Vec<f64>,
        summer_design_values: Option<Vec<f64>>,
        winter_design_values: Option<Vec<f64>>,
        #[builder(default)] timestep: Timestep,
        type_limit: Option<TypeLimit>,
    ) -> Result<Self> {
        let pattern = |suffix: &str, values: &[f64]| {
            let identifier = format!("{identifier}_{suffix}");
            DayPattern::from_values_at_timestep(identifier, values, timestep, true)
        };
        let groups = group_weekdays(&week_values, |left, right| left == right);
        let mut rules = groups
            .into_iter()
            .map(|(weekdays, values)| {
                let first = weekdays.iter().next().unwrap_or(Weekday::Sunday);
                Ok(Rule::with_range(pattern(first.name(), values)?, weekdays, DayRange::FULL_YEAR))
            })
            .collect::<Result<Vec<_>>>()?;
        let default_day_pattern = rules.remove(0).into_day_pattern();

        let mean = |values: &&Vec<f64>| OrderedFloat(mean(values));
        let summer_design_values = summer_design_values
            .or_else(|| week_values.iter().max_by_key(mean).cloned())
            .unwrap_or_default();
        let winter_design_values = winter_design_values
            .or_else(|| week_values.iter().min_by_key(mean).cloned())
            .unwrap_or_default();
        Self::builder()
            .identifier(identifier.as_str())
            .default_day_pattern(default_day_pattern)
            .rules(rules)
            .maybe_type_limit(type_limit)
            .holiday_pattern(pattern("Hol", &holiday_values)?)
            .summer_design_pattern(pattern("SmrDsn", &summer_design_values)?)
            .winter_design_pattern(pattern("WntrDsn", &winter_design_values)?)
            .build()
    }

    /// Single-week ruleset from a day pattern per weekday, Sunday first.
    ///
    /// Weekdays with the same pattern identifier share a rule. Without explicit design days,
    /// the summer one is the pattern of the highest hourly mean and the winter one is the
    /// pattern of the lowest.
    #[builder]
    pub fn from_week_day_patterns(
        #[builder(into)] identifier: String,
        week: [DayPattern; 7],
        holiday_pattern: DayPattern,
        summer_design_pattern: Option<DayPattern>,
        winter_design_pattern: Option<DayPattern>,
        type_limit: Option<TypeLimit>,
    ) -> Result<Self> {
        let groups = group_weekdays(&week, |left, right| left.identifier() == right.identifier());
        let mut rules = groups
            .into_iter()
            .map(|(weekdays, pattern)| {
                Rule::with_range(pattern.clone(), weekdays, DayRange::FULL_YEAR)
            })
            .collect_vec();
        let default_day_pattern = rules.remove(0).into_day_pattern();

        let mean =
            |pattern: &&DayPattern| OrderedFloat(pattern.mean_at_timestep(Timestep::HOURLY));
        let summer_design_pattern =
            summer_design_pattern.or_else(|| week.iter().max_by_key(mean).cloned());
        let winter_design_pattern =
            winter_design_pattern.or_else(|| week.iter().min_by_key(mean).cloned());
        Self::builder()
            .identifier(identifier)
            .default_day_pattern(default_day_pattern)
            .rules(rules)
            .maybe_type_limit(type_limit)
            .holiday_pattern(holiday_pattern)
            .maybe_summer_design_pattern(summer_design_pattern)
            .maybe_winter_design_pattern(winter_design_pattern)
            .build()
    }
}

/// Group the weekdays of equal days, in order of their first weekday.
fn group_weekdays<T>(
    week: &[T; 7],
    is_equal: impl Fn(&T, &T) -> bool,
) -> Vec<(EnumSet<Weekday>, &T)> {
    let mut groups: Vec<(EnumSet<Weekday>, &T)> = Vec::new();
    for (weekday, day) in Weekday::ALL.into_iter().zip(week) {
        match groups.iter_mut().find(|(_, known)| is_equal(known, day)) {
            Some((weekdays, _)) => *weekdays |= weekday,
            None => groups.push((EnumSet::only(weekday), day)),
        }
    }
    groups
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::schedule::ruleset::tests::office_day;

    fn hours(occupied: f64) -> Vec<f64> {
        let mut values = vec![0.0; 24];
        values[9..17].fill(occupied);
        values
    }

    #[test]
    fn from_constant_value_ok() -> Result {
        let ruleset = Ruleset::from_constant_value("Constant", 0.3, None)?;
        assert!(ruleset.is_constant());
        assert_eq!(ruleset.default_day_pattern().identifier(), "Constant_Day Schedule");
        assert!(ruleset.values().call()?.iter().all(|value| *value == 0.3));
        Ok(())
    }

    #[test]
    fn from_daily_values_ok() -> Result {
        let ruleset = Ruleset::from_daily_values("Daily", &hours(1.0), Timestep::HOURLY, None)?;
        let values = ruleset.values().call()?;
        assert_eq!(values[..24], hours(1.0));
        assert_eq!(values[24 * 200..24 * 201], hours(1.0));
        assert!(Ruleset::from_daily_values("Daily", &[1.0; 23], Timestep::HOURLY, None).is_err());
        Ok(())
    }

    #[test]
    fn from_week_daily_values_ok() -> Result {
        let weekend = vec![0.0; 24];
        let ruleset = Ruleset::from_week_daily_values()
            .identifier("Office")
            .week_values([
                weekend.clone(),
                hours(1.0),
                hours(1.0),
                hours(1.0),
                hours(1.0),
                hours(0.5),
                weekend.clone(),
            ])
            .holiday_values(weekend)
            .call()?;

        assert_eq!(ruleset.default_day_pattern().identifier(), "Office_Sunday");
        assert_eq!(ruleset.len(), 2);
        assert_eq!(ruleset.rules()[0].day_pattern().identifier(), "Office_Monday");
        assert_eq!(
            ruleset.rules()[0].weekdays(),
            Weekday::Monday | Weekday::Tuesday | Weekday::Wednesday | Weekday::Thursday,
        );
        assert_eq!(ruleset.rules()[1].weekdays(), EnumSet::only(Weekday::Friday));
        assert_eq!(ruleset.holiday_pattern().map(DayPattern::identifier), Some("Office_Hol"));

        let hourly = |pattern: &DayPattern| pattern.values_at_timestep(Timestep::HOURLY);
        assert_eq!(ruleset.summer_design_pattern().map(hourly), Some(hours(1.0)));
        assert_eq!(ruleset.winter_design_pattern().map(hourly), Some(vec![0.0; 24]));

        let values = ruleset.values().call()?;
        assert_eq!(values[24..48], hours(1.0));
        assert_eq!(values[24 * 5..24 * 6], hours(0.5));
        Ok(())
    }

    #[test]
    fn from_week_day_patterns_ok() -> Result {
        let open = office_day("Open", 1.0);
        let closed = DayPattern::constant("Closed", 0.0)?;
        let ruleset = Ruleset::from_week_day_patterns()
            .identifier("Shop")
            .week([
                closed.clone(),
                open.clone(),
                open.clone(),
                open.clone(),
                open.clone(),
                open.clone(),
                open.clone(),
            ])
            .holiday_pattern(closed)
            .call()?;
        assert_eq!(ruleset.default_day_pattern().identifier(), "Closed");
        assert_eq!(ruleset.len(), 1);
        assert_eq!(ruleset.rules()[0].weekdays(), EnumSet::all() - Weekday::Sunday);
        assert_eq!(ruleset.summer_design_pattern().map(DayPattern::identifier), Some("Open"));
        assert_eq!(ruleset.winter_design_pattern().map(DayPattern::identifier), Some("Closed"));
        assert_eq!(ruleset.day_patterns().len(), 2);
        Ok(())
    }

    #[test]
    fn shift_by_step_ok() -> Result {
        let ruleset = Ruleset::from_daily_values("Daily", &hours(1.0), Timestep::HOURLY, None)?;
        let shifted = ruleset.shift_by_step(2, Timestep::HOURLY)?;
        assert_eq!(shifted.identifier(), "Daily_Shift_120mins");
        let values = shifted.values().call()?;
        assert_abs_diff_eq!(values[10], 0.0);
        assert_abs_diff_eq!(values[11], 1.0);
        assert_abs_diff_eq!(values[18], 1.0);
        assert_abs_diff_eq!(values[19], 0.0);
        Ok(())
    }
}
