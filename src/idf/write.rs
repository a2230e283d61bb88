use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::{
    calendar::Weekday,
    idf::Kind,
    prelude::*,
    schedule::{
        Breakpoint,
        DayPattern,
        MINUTES_PER_DAY,
        Ruleset,
        TypeLimit,
        WeekGroup,
        WeeklySchedule,
        YearSchedule,
    },
};

/// Text export of the ruleset, see [`write_year_schedule`].
pub fn write_ruleset(ruleset: &Ruleset) -> String {
    write_year_schedule(&ruleset.to_year_schedule())
}

/// Type limit, day patterns, week groups and the year, separated by blank lines.
#[instrument(skip_all, fields(identifier = schedule.identifier()))]
pub fn write_year_schedule(schedule: &YearSchedule) -> String {
    let type_limit = schedule.type_limit();
    let mut objects = type_limit.map(type_limit_object).into_iter().collect_vec();
    match schedule {
        YearSchedule::Constant { identifier, value, .. } => {
            objects.push(constant_object(identifier, type_limit, *value));
        }
        YearSchedule::Weekly(schedule) => {
            let default_day_pattern = &schedule.default_day_pattern;
            objects.extend(schedule.day_patterns.iter().map(|day| day_object(day, type_limit)));
            objects.extend(schedule.weeks.iter().map(|week| week_object(week, default_day_pattern)));
            objects.push(year_object(schedule));
        }
    }
    debug!(n_objects = objects.len(), "written");
    format!("{}\n", objects.iter().join("\n\n"))
}

/// Object with a comment on every field.
struct Object {
    kind: Kind,
    fields: Vec<(String, String)>,
}

impl Object {
    const fn new(kind: Kind) -> Self {
        Self { kind, fields: Vec::new() }
    }

    fn push(&mut self, value: impl Display, comment: impl Into<String>) {
        self.fields.push((value.to_string(), comment.into()));
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},", self.kind)?;
        for (index, (value, comment)) in self.fields.iter().enumerate() {
            let separator = if index + 1 == self.fields.len() { ';' } else { ',' };
            let cell = format!("{value}{separator}");
            write!(f, "\n {cell:<25} !- {comment}")?;
        }
        Ok(())
    }
}

fn type_limit_identifier(type_limit: Option<&TypeLimit>) -> &str {
    type_limit.map_or("", TypeLimit::identifier)
}

fn type_limit_object(type_limit: &TypeLimit) -> Object {
    let limit = |limit: Option<f64>| limit.map(|limit| limit.to_string()).unwrap_or_default();
    let mut object = Object::new(Kind::TypeLimits);
    object.push(type_limit.identifier(), "name");
    object.push(limit(type_limit.lower_limit()), "lower limit value");
    object.push(limit(type_limit.upper_limit()), "upper limit value");
    object.push(type_limit.numeric_type(), "numeric type");
    object.push(type_limit.unit_type(), "unit type");
    object
}

fn constant_object(identifier: &str, type_limit: Option<&TypeLimit>, value: f64) -> Object {
    let mut object = Object::new(Kind::Constant);
    object.push(identifier, "schedule name");
    object.push(type_limit_identifier(type_limit), "schedule type limits");
    object.push(value, "value");
    object
}

/// Every value holds until the time of the next breakpoint, the last one until `24:00`.
fn day_object(pattern: &DayPattern, type_limit: Option<&TypeLimit>) -> Object {
    let mut object = Object::new(Kind::DayInterval);
    object.push(pattern.identifier(), "schedule name");
    object.push(type_limit_identifier(type_limit), "schedule type limits");
    object.push(if pattern.interpolate() { "Linear" } else { "No" }, "interpolate to timestep");
    let breakpoints = pattern.breakpoints();
    for (index, breakpoint) in breakpoints.iter().enumerate() {
        let until = breakpoints.get(index + 1).map_or(MINUTES_PER_DAY, Breakpoint::minute_of_day);
        let count = index + 1;
        let until = format!("{:02}:{:02}", until / 60, until % 60);
        object.push(until, format!("time {count} {{hh:mm}}"));
        object.push(breakpoint.value, format!("value until time {count}"));
    }
    object
}

/// Custom days are not used by rulesets and repeat the default day pattern.
fn week_object(week: &WeekGroup, default_day_pattern: &str) -> Object {
    let mut object = Object::new(Kind::WeekDaily);
    object.push(&week.identifier, "name");
    for weekday in Weekday::ALL {
        object.push(week.day(weekday), weekday.name().to_lowercase());
    }
    object.push(&week.holiday, "holiday");
    object.push(&week.summer_design, "summer design day");
    object.push(&week.winter_design, "winter design day");
    object.push(default_day_pattern, "custom day 1");
    object.push(default_day_pattern, "custom day 2");
    object
}

/// A period ending on February 28 extends through February 29, which the range
/// implicitly contains in leap years.
fn year_object(schedule: &WeeklySchedule) -> Object {
    let mut object = Object::new(Kind::Year);
    object.push(&schedule.identifier, "schedule name");
    object.push(type_limit_identifier(schedule.type_limit.as_ref()), "schedule type limits");
    for (index, period) in schedule.periods.iter().enumerate() {
        let count = index + 1;
        let start = period.range.start_date();
        let end = period.range.end_date();
        let end_day = if (end.month(), end.day()) == (2, 28) { 29 } else { end.day() };
        object.push(&period.week, format!("week schedule {count}"));
        object.push(start.month(), format!("start month {count}"));
        object.push(start.day(), format!("start day {count}"));
        object.push(end.month(), format!("end month {count}"));
        object.push(end_day, format!("end day {count}"));
    }
    object
}

#[cfg(test)]
mod tests {
    use enumset::EnumSet;

    use super::*;
    use crate::{
        calendar::MonthDay,
        schedule::{Rule, library},
    };

    #[test]
    fn day_object_ok() -> Result {
        let pattern = DayPattern::new(
            "Office Occupancy",
            vec![
                Breakpoint::at(0, 0, 0.0)?,
                Breakpoint::at(9, 0, 1.0)?,
                Breakpoint::at(17, 30, 0.25)?,
            ],
            false,
        )?;
        let expected = r"Schedule:Day:Interval,
 Office Occupancy,         !- schedule name
 Fractional,               !- schedule type limits
 No,                       !- interpolate to timestep
 09:00,                    !- time 1 {hh:mm}
 0,                        !- value until time 1
 17:30,                    !- time 2 {hh:mm}
 1,                        !- value until time 2
 24:00,                    !- time 3 {hh:mm}
 0.25;                     !- value until time 3";
        assert_eq!(day_object(&pattern, Some(library::fractional())).to_string(), expected);
        Ok(())
    }

    #[test]
    fn long_field_keeps_a_space() {
        let mut object = Object::new(Kind::Constant);
        object.push("A Rather Long Schedule Name", "schedule name");
        assert_eq!(
            object.to_string(),
            "Schedule:Constant,\n A Rather Long Schedule Name; !- schedule name",
        );
    }

    #[test]
    fn constant_ok() -> Result {
        let ruleset = Ruleset::from_constant_value("Always Half", 0.5, None)?;
        let expected = r"Schedule:Constant,
 Always Half,              !- schedule name
 ,                         !- schedule type limits
 0.5;                      !- value
";
        assert_eq!(write_ruleset(&ruleset), expected);
        Ok(())
    }

    #[test]
    fn weekly_ok() -> Result {
        let ruleset = Ruleset::builder()
            .identifier("Heating")
            .default_day_pattern(DayPattern::constant("Setback", 15.0)?)
            .rules(vec![
                Rule::builder()
                    .day_pattern(DayPattern::constant("Comfort", 21.0)?)
                    .weekdays(Weekday::WORKING_DAYS)
                    .end_date(MonthDay::new(2, 28)?)
                    .build()?,
                Rule::builder()
                    .day_pattern(DayPattern::constant("Weekend", 18.0)?)
                    .weekdays(EnumSet::only(Weekday::Saturday))
                    .build()?,
            ])
            .type_limit(library::temperature().clone())
            .build()?;
        let text = write_ruleset(&ruleset);

        assert!(text.starts_with("ScheduleTypeLimits,\n Temperature,"));
        assert!(text.contains("\n -273.15,                  !- lower limit value\n"));
        assert!(text.contains("\n ,                         !- upper limit value\n"));
        assert_eq!(text.matches("Schedule:Day:Interval,").count(), 3);
        assert_eq!(text.matches("Schedule:Week:Daily,").count(), 2);
        assert!(text.contains("\n Comfort,                  !- monday\n"));
        assert!(text.contains("\n Setback;                  !- custom day 2\n"));

        // The first period runs through February 29:
        assert!(text.contains("\n Heating_Week 1,           !- week schedule 1\n"));
        assert!(text.contains("\n 2,                        !- end month 1\n"));
        assert!(text.contains("\n 29,                       !- end day 1\n"));
        assert!(text.contains("\n 3,                        !- start month 2\n"));
        assert!(text.ends_with(" 31;                       !- end day 2\n"));
        Ok(())
    }
}
