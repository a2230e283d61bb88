use std::{fs, path::PathBuf};

use almanac::{idf, interchange::ScheduleRecord};
use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use tracing::{info, instrument};

use crate::cli::print_json;

#[derive(Parser)]
pub struct ConvertArgs {
    /// Reference type limits by their identifiers.
    #[clap(long)]
    pub abridged: bool,

    /// Weekly text export with `Schedule:Year` or `Schedule:Constant` objects.
    pub path: PathBuf,
}

#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn convert(args: &ConvertArgs) -> Result<()> {
    let text = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read `{}`", args.path.display()))?;
    let records = idf::read_rulesets(&text)?
        .iter()
        .map(|ruleset| ScheduleRecord::from_ruleset(ruleset, args.abridged))
        .collect_vec();
    info!(n_schedules = records.len(), "converted");
    print_json(&records)
}
