use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    calendar::{DAYS_IN_COMMON_YEAR, Timestep, Weekday},
    prelude::*,
    schedule::{
        DayPattern,
        Ruleset,
        TypeLimit,
        averaging_weights,
        day::weighted_values,
        ruleset::{Week, compact::contiguous_ranges},
    },
};

impl Ruleset {
    /// Weighted average of rulesets, preserving their rule structure.
    ///
    /// Single-week inputs average into a single week. Otherwise, the year is split into cells
    /// with the same active rules in every input, each cell is averaged as a single week,
    /// and the cells are stitched back together as date-scoped rules.
    ///
    /// Weights default to equal ones. The type limit is taken from the first ruleset,
    /// continuous since averages of discrete values are fractional.
    #[instrument(skip_all, fields(n_rulesets = rulesets.len()))]
    pub fn average(
        identifier: impl Into<String>,
        rulesets: &[&Self],
        weights: Option<&[f64]>,
        timestep: Timestep,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let weights = averaging_weights(weights, rulesets.len())?;
        let type_limit = rulesets[0].type_limit().map(TypeLimit::to_continuous);

        if rulesets.iter().all(|ruleset| ruleset.is_single_week()) {
            info!(%identifier, "averaging single weeks…");
            let weeks = rulesets
                .iter()
                .map(|ruleset| ruleset.week(&(0..ruleset.len()).collect_vec()))
                .collect_vec();
            return average_week(identifier, &weeks, &weights, timestep, type_limit);
        }

        let mut cells: Vec<Vec<Vec<usize>>> = Vec::new();
        let mut cell_indices: HashMap<Vec<Vec<usize>>, usize> = HashMap::new();
        let active_rules =
            rulesets.iter().map(|ruleset| ruleset.active_rules_by_day()).collect_vec();
        let cell_by_day = (0..usize::from(DAYS_IN_COMMON_YEAR))
            .map(|day_index| {
                let cell =
                    active_rules.iter().map(|by_day| by_day[day_index].clone()).collect_vec();
                *cell_indices.entry(cell).or_insert_with_key(|cell| {
                    cells.push(cell.clone());
                    cells.len() - 1
                })
            })
            .collect_vec();
        info!(%identifier, n_cells = cells.len(), "averaging partitioned weeks…");

        let averaged_cells = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let weeks = rulesets
                    .iter()
                    .zip(cell)
                    .map(|(ruleset, active_rules)| ruleset.week(active_rules))
                    .collect_vec();
                let cell_identifier = format!("{identifier}_{}", index + 1);
                average_week(cell_identifier, &weeks, &weights, timestep, type_limit.clone())
            })
            .collect::<Result<Vec<_>>>()?;

        let ranges = contiguous_ranges(&cell_by_day);
        let mut rules = ranges
            .iter()
            .flat_map(|(cell, range)| averaged_cells[*cell].rules_within(*range))
            .collect_vec();
        let default_day_pattern = rules.remove(0).into_day_pattern();

        // Special days are the same in every cell:
        let first_cell = &averaged_cells[0];
        Self::builder()
            .identifier(identifier)
            .default_day_pattern(default_day_pattern)
            .rules(rules)
            .maybe_type_limit(type_limit)
            .maybe_holiday_pattern(first_cell.holiday_pattern().map(DayPattern::duplicate))
            .maybe_summer_design_pattern(
                first_cell.summer_design_pattern().map(DayPattern::duplicate),
            )
            .maybe_winter_design_pattern(
                first_cell.winter_design_pattern().map(DayPattern::duplicate),
            )
            .build()
    }
}

/// Average every slot of the weeks into a single-week ruleset.
fn average_week(
    identifier: String,
    weeks: &[Week<'_>],
    weights: &[f64],
    timestep: Timestep,
    type_limit: Option<TypeLimit>,
) -> Result<Ruleset> {
    let average = |patterns: Vec<&DayPattern>| {
        weighted_values(patterns.into_iter().zip(weights.iter().copied()), timestep)
    };
    let week_values = Weekday::ALL
        .map(|weekday| average(weeks.iter().map(|week| week.days[weekday.index()]).collect()));
    Ruleset::from_week_daily_values()
        .identifier(identifier)
        .week_values(week_values)
        .holiday_values(average(weeks.iter().map(|week| week.holiday).collect()))
        .summer_design_values(average(weeks.iter().map(|week| week.summer_design).collect()))
        .winter_design_values(average(weeks.iter().map(|week| week.winter_design).collect()))
        .timestep(timestep)
        .maybe_type_limit(type_limit)
        .call()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use enumset::EnumSet;

    use super::*;
    use crate::{
        calendar::MonthDay,
        schedule::{NumericType, Rule, library, ruleset::tests::office_day},
    };

    fn office() -> Result<Ruleset> {
        Ruleset::builder()
            .identifier("Office Occupancy")
            .default_day_pattern(DayPattern::constant("Office Closed", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(office_day("Office Open", 1.0))
                    .weekdays(Weekday::WORKING_DAYS)
                    .build()?,
            ])
            .holiday_pattern(DayPattern::constant("Office Holiday", 0.0)?)
            .build()
    }

    fn lobby() -> Result<Ruleset> {
        Ruleset::from_constant_value("Lobby Occupancy", 0.2, None)
    }

    fn seasonal() -> Result<Ruleset> {
        Ruleset::builder()
            .identifier("Seasonal")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(DayPattern::constant("Summer", 0.5)?)
                    .weekdays(EnumSet::all())
                    .start_date(MonthDay::new(6, 1)?)
                    .end_date(MonthDay::new(8, 31)?)
                    .build()?,
                Rule::builder()
                    .day_pattern(DayPattern::constant("Weekend", 1.0)?)
                    .weekdays(Weekday::WEEKEND)
                    .start_date(MonthDay::new(3, 1)?)
                    .end_date(MonthDay::new(10, 31)?)
                    .applies_to_holidays(true)
                    .build()?,
            ])
            .build()
    }

    fn values(ruleset: &Ruleset, start_weekday: Weekday, is_leap_year: bool) -> Result<Vec<f64>> {
        let holidays = [MonthDay::JANUARY_1, MonthDay::new(7, 4)?, MonthDay::new(12, 25)?];
        ruleset
            .values()
            .start_weekday(start_weekday)
            .holidays(&holidays)
            .is_leap_year(is_leap_year)
            .call()
    }

    fn assert_weighted_sum(average: &Ruleset, inputs: &[(&Ruleset, f64)]) -> Result {
        for is_leap_year in [false, true] {
            for start_weekday in Weekday::ALL {
                let mut expected = vec![0.0; if is_leap_year { 8784 } else { 8760 }];
                for (ruleset, weight) in inputs {
                    let values = values(ruleset, start_weekday, is_leap_year)?;
                    for (total, value) in expected.iter_mut().zip(values) {
                        *total += weight * value;
                    }
                }
                let actual = values(average, start_weekday, is_leap_year)?;
                for (actual, expected) in actual.into_iter().zip(expected) {
                    assert_abs_diff_eq!(actual, expected, epsilon = 1e-9);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn office_and_lobby_ok() -> Result {
        let (office, lobby) = (office()?, lobby()?);
        let average = Ruleset::average("Office Average", &[&office, &lobby], None, Timestep::HOURLY)?;
        assert!(average.is_single_week());
        assert_eq!(average.len(), 1);
        assert_eq!(average.rules()[0].weekdays(), Weekday::WORKING_DAYS);

        let weekday = average.rules()[0].day_pattern().values_at_timestep(Timestep::HOURLY);
        assert_abs_diff_eq!(weekday[0], 0.1);
        assert_abs_diff_eq!(weekday[12], 0.6);
        let weekend = average.default_day_pattern().values_at_timestep(Timestep::HOURLY);
        assert_abs_diff_eq!(weekend[12], 0.1);
        assert!(average.default_day_pattern().is_constant());

        assert_weighted_sum(&average, &[(&office, 0.5), (&lobby, 0.5)])
    }

    #[test]
    fn weighted_ok() -> Result {
        let (office, lobby) = (office()?, lobby()?);
        let weights = [0.75, 0.25];
        let average =
            Ruleset::average("Weighted", &[&office, &lobby], Some(&weights), Timestep::HOURLY)?;
        assert_weighted_sum(&average, &[(&office, 0.75), (&lobby, 0.25)])
    }

    #[test]
    fn identity_ok() -> Result {
        for ruleset in [office()?, seasonal()?] {
            let average = Ruleset::average("Identity", &[&ruleset], Some(&[1.0]), Timestep::HOURLY)?;
            assert_weighted_sum(&average, &[(&ruleset, 1.0)])?;
        }
        Ok(())
    }

    #[test]
    fn linearity_ok() -> Result {
        let a = Ruleset::from_constant_value("A", 0.2, None)?;
        let b = Ruleset::from_constant_value("B", 0.8, None)?;
        let average = Ruleset::average("Linear", &[&a, &b], Some(&[0.25, 0.75]), Timestep::HOURLY)?;
        assert!(average.is_constant());
        assert_abs_diff_eq!(
            average.default_day_pattern().breakpoints()[0].value,
            0.25f64.mul_add(0.2, 0.75 * 0.8),
            epsilon = 1e-12,
        );
        Ok(())
    }

    #[test]
    fn partitioned_ok() -> Result {
        let (seasonal, office) = (seasonal()?, office()?);
        let weights = [0.4, 0.6];
        let average =
            Ruleset::average("Partitioned", &[&seasonal, &office], Some(&weights), Timestep::HOURLY)?;
        assert!(!average.is_single_week());
        assert_weighted_sum(&average, &[(&seasonal, 0.4), (&office, 0.6)])
    }

    #[test]
    fn discrete_limit_becomes_continuous() -> Result {
        let on = Ruleset::from_constant_value("On", 1.0, Some(library::on_off().clone()))?;
        let off = Ruleset::from_constant_value("Off", 0.0, Some(library::on_off().clone()))?;
        let average = Ruleset::average("Half On", &[&on, &off], Some(&[0.5, 0.5]), Timestep::HOURLY)?;
        assert_abs_diff_eq!(average.default_day_pattern().breakpoints()[0].value, 0.5);
        let type_limit = average.type_limit().expect("the type limit should be inherited");
        assert_eq!(type_limit.identifier(), library::on_off().identifier());
        assert_eq!(type_limit.numeric_type(), NumericType::Continuous);
        assert_eq!(type_limit.upper_limit(), Some(1.0));
        Ok(())
    }

    #[test]
    fn rejects_bad_input() -> Result {
        let office = office()?;
        assert_eq!(
            Ruleset::average("Empty", &[], None, Timestep::HOURLY),
            Err(Error::from(ValidationError::NoSchedules)),
        );
        let overweight =
            Ruleset::average("Overweight", &[&office, &office], Some(&[0.7, 0.7]), Timestep::HOURLY);
        assert!(matches!(overweight, Err(Error::Validation(ValidationError::WeightSum(_)))));
        Ok(())
    }
}
