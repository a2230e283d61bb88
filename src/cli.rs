mod average;
mod config;
mod convert;
mod export;
mod values;

use std::{
    fs,
    path::{Path, PathBuf},
};

use almanac::{
    calendar::{MonthDay, Timestep, Weekday},
    interchange::ScheduleRecord,
    schedule::{Ruleset, TypeLimit},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

pub use self::{
    average::{AverageArgs, average},
    config::Config,
    convert::{ConvertArgs, convert},
    export::{ExportArgs, WeeksArgs, export, weeks},
    values::{ValuesArgs, values},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// TOML file with calendar defaults and additional type limits.
    #[clap(long, env = "ALMANAC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a JSON schedule into its sequence of values.
    #[clap(name = "values")]
    Values(Box<ValuesArgs>),

    /// Print the weekly text export of a JSON schedule.
    #[clap(name = "export")]
    Export(ExportArgs),

    /// Print the week groups of a JSON schedule and their date periods.
    #[clap(name = "weeks")]
    Weeks(WeeksArgs),

    /// Average JSON schedules and print the result as JSON.
    #[clap(name = "average")]
    Average(Box<AverageArgs>),

    /// Convert the schedules of a weekly text export into JSON.
    #[clap(name = "convert")]
    Convert(ConvertArgs),
}

#[derive(Parser)]
pub struct ScheduleArgs {
    /// JSON file with a `ScheduleRuleset` or `ScheduleRulesetAbridged` record.
    pub schedule: PathBuf,
}

impl ScheduleArgs {
    pub fn read(&self, config: &Config) -> Result<Ruleset> {
        read_ruleset(&self.schedule, &config.type_limits()?)
    }
}

/// Calendar to project the schedule onto. Unset options fall back to the configuration.
#[derive(Parser)]
pub struct CalendarArgs {
    /// Values per hour.
    #[clap(long, env = "ALMANAC_TIMESTEP")]
    pub timestep: Option<Timestep>,

    /// Weekday of January 1.
    #[clap(long, env = "ALMANAC_START_WEEKDAY")]
    pub start_weekday: Option<Weekday>,

    #[clap(long, env = "ALMANAC_LEAP_YEAR")]
    pub leap_year: bool,

    /// Holidays as `month/day`, for example `12/25`.
    #[clap(long = "holiday", env = "ALMANAC_HOLIDAYS", value_delimiter = ',')]
    pub holidays: Vec<MonthDay>,
}

impl CalendarArgs {
    pub fn timestep(&self, config: &Config) -> Timestep {
        self.timestep.or(config.timestep).unwrap_or_default()
    }

    pub fn start_weekday(&self, config: &Config) -> Weekday {
        self.start_weekday.or(config.start_weekday).unwrap_or(Weekday::Sunday)
    }

    pub const fn is_leap_year(&self, config: &Config) -> bool {
        self.leap_year || config.leap_year
    }

    pub fn holidays<'a>(&'a self, config: &'a Config) -> &'a [MonthDay] {
        if self.holidays.is_empty() { &config.holidays } else { &self.holidays }
    }
}

fn read_ruleset(path: &Path, type_limits: &[TypeLimit]) -> Result<Ruleset> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let record: ScheduleRecord = serde_json::from_str(&text)
        .with_context(|| format!("`{}` is not a schedule record", path.display()))?;
    Ok(record.into_ruleset(type_limits)?)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
