mod cli;
mod tables;

use clap::{Parser, crate_version};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, Config, average, convert, export, values, weeks};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let config = Config::read_from(args.config.as_deref())?;

    match args.command {
        Command::Values(args) => values(&args, &config)?,
        Command::Export(args) => export(&args, &config)?,
        Command::Weeks(args) => weeks(&args, &config)?,
        Command::Average(args) => average(&args, &config)?,
        Command::Convert(args) => convert(&args)?,
    }

    info!("done!");
    Ok(())
}
