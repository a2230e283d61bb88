use almanac::{idf, schedule::YearSchedule};
use anyhow::Result;
use clap::Parser;
use tracing::{info, instrument};

use crate::{
    cli::{Config, ScheduleArgs},
    tables::build_weeks_table,
};

#[derive(Parser)]
pub struct ExportArgs {
    #[clap(flatten)]
    pub schedule: ScheduleArgs,
}

#[instrument(skip_all, fields(schedule = %args.schedule.schedule.display()))]
pub fn export(args: &ExportArgs, config: &Config) -> Result<()> {
    let ruleset = args.schedule.read(config)?;
    print!("{}", idf::write_ruleset(&ruleset));
    Ok(())
}

#[derive(Parser)]
pub struct WeeksArgs {
    #[clap(flatten)]
    pub schedule: ScheduleArgs,
}

#[instrument(skip_all, fields(schedule = %args.schedule.schedule.display()))]
pub fn weeks(args: &WeeksArgs, config: &Config) -> Result<()> {
    match args.schedule.read(config)?.to_year_schedule() {
        YearSchedule::Constant { identifier, value, .. } => {
            info!(%identifier, value, "constant all year round");
        }
        YearSchedule::Weekly(schedule) => {
            info!(
                identifier = %schedule.identifier,
                n_weeks = schedule.weeks.len(),
                n_periods = schedule.periods.len(),
                "compacted",
            );
            println!("{}", build_weeks_table(&schedule));
        }
    }
    Ok(())
}
