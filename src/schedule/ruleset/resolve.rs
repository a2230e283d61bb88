use std::collections::{HashMap, HashSet};

use bon::bon;

use crate::{
    calendar::{MonthDay, Timestep, Weekday},
    prelude::*,
    schedule::Ruleset,
};

#[bon]
impl Ruleset {
    /// Resolve the ruleset into one value per timestep between the dates, both inclusive.
    ///
    /// `start_weekday` is the weekday of January 1. Holidays that do not exist in the year
    /// are skipped.
    #[builder]
    pub fn values(
        &self,
        #[builder(default)] timestep: Timestep,
        #[builder(default = MonthDay::JANUARY_1)] start_date: MonthDay,
        #[builder(default = MonthDay::DECEMBER_31)] end_date: MonthDay,
        #[builder(default = Weekday::Sunday)] start_weekday: Weekday,
        #[builder(default)] holidays: &[MonthDay],
        #[builder(default)] is_leap_year: bool,
    ) -> Result<Vec<f64>> {
        let start = start_date.day_of_year(is_leap_year)?;
        let end = end_date.day_of_year(is_leap_year)?;
        if start > end {
            return Err(ValidationError::DateOrder { start: start_date, end: end_date }.into());
        }
        let holidays: HashSet<u16> = holidays
            .iter()
            .filter_map(|holiday| {
                holiday
                    .day_of_year(is_leap_year)
                    .inspect_err(|_| warn!(%holiday, "skipping the holiday outside of a leap year"))
                    .ok()
            })
            .collect();
        debug!(
            identifier = self.identifier(),
            %start_date,
            %end_date,
            %timestep,
            n_holidays = holidays.len(),
            "resolving…",
        );

        let sampled: HashMap<&str, Vec<f64>> = self
            .day_patterns()
            .into_iter()
            .map(|pattern| (pattern.identifier(), pattern.values_at_timestep(timestep)))
            .collect();
        let mut values = Vec::with_capacity(usize::from(end - start + 1) * timestep.steps_per_day());
        for day_of_year in start..=end {
            let pattern = self.day_pattern_on(
                day_of_year,
                start_weekday.of_day(day_of_year),
                holidays.contains(&day_of_year),
                is_leap_year,
            );
            values.extend_from_slice(&sampled[pattern.identifier()]);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use enumset::EnumSet;

    use super::*;
    use crate::schedule::{DayPattern, Rule};

    fn weekday_ruleset() -> Result<Ruleset> {
        Ruleset::builder()
            .identifier("Weekdays")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(DayPattern::constant("On", 1.0)?)
                    .weekdays(Weekday::WORKING_DAYS)
                    .build()?,
            ])
            .build()
    }

    fn daily_means(values: &[f64]) -> Vec<f64> {
        values.chunks(24).map(|day| day.iter().sum::<f64>() / 24.0).collect()
    }

    #[test]
    fn year_length_ok() -> Result {
        let ruleset = weekday_ruleset()?;
        assert_eq!(ruleset.values().call()?.len(), 8760);
        assert_eq!(ruleset.values().is_leap_year(true).call()?.len(), 8784);
        assert_eq!(ruleset.values().timestep(Timestep::new(4)?).call()?.len(), 8760 * 4);
        Ok(())
    }

    #[test]
    fn start_weekday_ok() -> Result {
        let ruleset = weekday_ruleset()?;
        let days = daily_means(&ruleset.values().start_weekday(Weekday::Saturday).call()?);
        assert_eq!(days[..9], [0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn first_matching_rule_wins() -> Result {
        let mut ruleset = weekday_ruleset()?;
        ruleset.add_rule(
            Rule::builder()
                .day_pattern(DayPattern::constant("Half", 0.5)?)
                .weekdays(EnumSet::only(Weekday::Monday))
                .build()?,
        )?;
        let days = daily_means(&ruleset.values().call()?);
        assert_eq!(days[..7], [0.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.0]);

        // Rules after the broader one never get a chance:
        let mut ruleset = weekday_ruleset()?;
        ruleset.insert_rule(
            1,
            Rule::builder()
                .day_pattern(DayPattern::constant("Half", 0.5)?)
                .weekdays(EnumSet::only(Weekday::Monday))
                .build()?,
        )?;
        let days = daily_means(&ruleset.values().call()?);
        assert_eq!(days[1], 1.0);
        Ok(())
    }

    #[test]
    fn empty_mask_falls_back_to_default() -> Result {
        let ruleset = Ruleset::builder()
            .identifier("Never")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![Rule::builder().day_pattern(DayPattern::constant("On", 1.0)?).build()?])
            .build()?;
        assert!(ruleset.values().call()?.iter().all(|value| *value == 0.0));
        Ok(())
    }

    #[test]
    fn holiday_pattern_takes_precedence() -> Result {
        let mut ruleset = weekday_ruleset()?;
        ruleset.set_holiday_pattern(Some(DayPattern::constant("Holiday", 0.25)?))?;
        let new_year = MonthDay::JANUARY_1;
        let christmas = MonthDay::new(12, 25)?;
        let days = daily_means(
            &ruleset.values().start_weekday(Weekday::Monday).holidays(&[new_year, christmas]).call()?,
        );
        assert_eq!(days[0], 0.25);
        assert_eq!(days[1], 1.0);
        assert_eq!(days[358], 0.25);
        Ok(())
    }

    #[test]
    fn holiday_falls_back_to_default() -> Result {
        let ruleset = Ruleset::builder()
            .identifier("Holiday Rule")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(DayPattern::constant("On", 1.0)?)
                    .weekdays(EnumSet::all())
                    .applies_to_holidays(true)
                    .build()?,
            ])
            .build()?;
        let holidays = [MonthDay::JANUARY_1, MonthDay::new(7, 4)?];
        let days = daily_means(&ruleset.values().holidays(&holidays).call()?);
        assert_eq!(days[0], 0.0);
        assert_eq!(days[1], 1.0);
        assert_eq!(days[184], 0.0);
        assert_eq!(days[185], 1.0);
        Ok(())
    }

    #[test]
    fn narrower_rule_wins_only_when_listed_first() -> Result {
        let all_year = Rule::builder()
            .day_pattern(DayPattern::constant("All Year", 1.0)?)
            .weekdays(EnumSet::only(Weekday::Monday))
            .build()?;
        let spring = Rule::builder()
            .day_pattern(DayPattern::constant("Spring", 0.5)?)
            .weekdays(EnumSet::only(Weekday::Monday))
            .start_date(MonthDay::from_day_of_year(100, false)?)
            .end_date(MonthDay::from_day_of_year(200, false)?)
            .build()?;
        let ruleset = |rules: Vec<Rule>| {
            Ruleset::builder()
                .identifier("Mondays")
                .default_day_pattern(DayPattern::constant("Off", 0.0)?)
                .rules(rules)
                .build()
        };

        // Day 150 is a Monday when the year starts on a Saturday:
        assert_eq!(Weekday::Saturday.of_day(150), Weekday::Monday);
        let day_150 = |ruleset: &Ruleset| -> Result<f64> {
            Ok(daily_means(&ruleset.values().start_weekday(Weekday::Saturday).call()?)[149])
        };
        assert_eq!(day_150(&ruleset(vec![all_year.clone(), spring.clone()])?)?, 1.0);
        assert_eq!(day_150(&ruleset(vec![spring, all_year])?)?, 0.5);
        Ok(())
    }

    #[test]
    fn skips_leap_day_holiday_in_common_year() -> Result {
        let ruleset = weekday_ruleset()?;
        let values = ruleset.values().holidays(&[MonthDay::new(2, 29)?]).call()?;
        assert_eq!(values, ruleset.values().call()?);
        Ok(())
    }

    #[test]
    fn partial_range_ok() -> Result {
        let ruleset = weekday_ruleset()?;
        let values = ruleset
            .values()
            .start_date(MonthDay::new(1, 2)?)
            .end_date(MonthDay::new(1, 3)?)
            .call()?;
        assert_eq!(daily_means(&values), [1.0, 1.0]);

        let reversed = ruleset
            .values()
            .start_date(MonthDay::new(2, 1)?)
            .end_date(MonthDay::new(1, 1)?)
            .call();
        assert!(matches!(reversed, Err(Error::Validation(ValidationError::DateOrder { .. }))));

        let leap_day = ruleset.values().start_date(MonthDay::new(2, 29)?).call();
        assert!(leap_day.is_err());
        Ok(())
    }

    #[test]
    fn leap_year_keeps_dates() -> Result {
        let ruleset = Ruleset::builder()
            .identifier("March")
            .default_day_pattern(DayPattern::constant("Off", 0.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(DayPattern::constant("On", 1.0)?)
                    .weekdays(EnumSet::all())
                    .start_date(MonthDay::new(3, 1)?)
                    .end_date(MonthDay::new(3, 11)?)
                    .build()?,
            ])
            .build()?;
        let days = daily_means(&ruleset.values().is_leap_year(true).call()?);
        assert_eq!(days.len(), 366);
        assert_eq!(days[59], 0.0);
        assert!(days[60..71].iter().all(|value| *value == 1.0));
        assert_eq!(days[71], 0.0);
        Ok(())
    }
}
