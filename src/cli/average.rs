use std::path::PathBuf;

use almanac::{calendar::Timestep, interchange::ScheduleRecord, schedule::Ruleset};
use anyhow::{Result, ensure};
use clap::Parser;
use itertools::Itertools;
use tracing::{info, instrument};

use crate::cli::{Config, print_json, read_ruleset};

#[derive(Parser)]
pub struct AverageArgs {
    /// Identifier of the averaged schedule.
    #[clap(long)]
    pub identifier: String,

    /// Weight per schedule, equal weights by default.
    #[clap(long, value_delimiter = ',')]
    pub weights: Vec<f64>,

    /// Values per hour of the averaged day patterns.
    #[clap(long, env = "ALMANAC_TIMESTEP")]
    pub timestep: Option<Timestep>,

    /// Reference the type limit by its identifier.
    #[clap(long)]
    pub abridged: bool,

    /// JSON files with schedule records.
    #[clap(required = true, num_args = 1..)]
    pub schedules: Vec<PathBuf>,
}

#[instrument(skip_all, fields(identifier = %args.identifier, n_schedules = args.schedules.len()))]
pub fn average(args: &AverageArgs, config: &Config) -> Result<()> {
    ensure!(
        args.weights.is_empty() || args.weights.len() == args.schedules.len(),
        "expected {} weights, got {}",
        args.schedules.len(),
        args.weights.len(),
    );
    let type_limits = config.type_limits()?;
    let rulesets = args
        .schedules
        .iter()
        .map(|path| read_ruleset(path, &type_limits))
        .collect::<Result<Vec<_>>>()?;
    let weights = (!args.weights.is_empty()).then_some(args.weights.as_slice());
    let timestep = args.timestep.or(config.timestep).unwrap_or_default();

    let average =
        Ruleset::average(args.identifier.as_str(), &rulesets.iter().collect_vec(), weights, timestep)?;
    info!(n_rules = average.len(), n_day_patterns = average.day_patterns().len(), "averaged");
    print_json(&ScheduleRecord::from_ruleset(&average, args.abridged))
}
