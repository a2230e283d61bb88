use almanac::calendar::MonthDay;
use anyhow::Result;
use clap::Parser;
use tracing::{info, instrument};

use crate::cli::{CalendarArgs, Config, ScheduleArgs, print_json};

#[derive(Parser)]
pub struct ValuesArgs {
    #[clap(flatten)]
    pub schedule: ScheduleArgs,

    #[clap(flatten)]
    pub calendar: CalendarArgs,

    /// First date of the range as `month/day`, January 1 by default.
    #[clap(long, env = "ALMANAC_START_DATE")]
    pub start_date: Option<MonthDay>,

    /// Last date of the range as `month/day`, December 31 by default.
    #[clap(long, env = "ALMANAC_END_DATE")]
    pub end_date: Option<MonthDay>,

    /// Print a JSON array instead of a value per line.
    #[clap(long)]
    pub json: bool,
}

#[instrument(skip_all, fields(schedule = %args.schedule.schedule.display()))]
pub fn values(args: &ValuesArgs, config: &Config) -> Result<()> {
    let ruleset = args.schedule.read(config)?;
    let values = ruleset
        .values()
        .timestep(args.calendar.timestep(config))
        .maybe_start_date(args.start_date)
        .maybe_end_date(args.end_date)
        .start_weekday(args.calendar.start_weekday(config))
        .holidays(args.calendar.holidays(config))
        .is_leap_year(args.calendar.is_leap_year(config))
        .call()?;
    info!(identifier = ruleset.identifier(), n_values = values.len(), "resolved");

    if args.json {
        print_json(&values)?;
    } else {
        for value in values {
            println!("{value}");
        }
    }
    Ok(())
}
