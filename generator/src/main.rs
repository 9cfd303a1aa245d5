//! Generator binary.
//!
//! Loads the client configuration, applies the run-time overrides given on the command line,
//! runs the generation pass and prints the generation plan as JSON on stdout. Logs go to
//! stderr.

use std::io;
use std::process::ExitCode;

use ::config::environment::Environment;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use planner::resolve::parse_date;
use telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_client_config;
use crate::core::{GenerationRequest, RuntimeOverrides, run_generation, write_units};
use crate::error::{GeneratorError, GeneratorResult};

mod config;
mod core;
mod error;

/// Generates event projections, identity keys and refresh plans from layered configuration.
#[derive(Parser, Debug)]
#[command(name = "generator")]
#[command(about = "Plans the generation of analytics event models")]
struct Args {
    /// Day the run is planned for (`YYYYMMDD` or `YYYY-MM-DD`), defaults to the current UTC day
    #[arg(long, value_parser = parse_day)]
    today: Option<NaiveDate>,

    /// Plans an initial load because the destination table does not exist yet
    #[arg(long)]
    initial_load: bool,

    /// Only generates the unit of this property
    #[arg(long)]
    property: Option<String>,

    /// Reloads the whole backfill range instead of the rolling window
    #[arg(long, conflicts_with = "no_backfill")]
    backfill: bool,

    /// Runs the rolling window even when the configuration requests a backfill
    #[arg(long)]
    no_backfill: bool,

    /// First backfilled day (`YYYYMMDD` or `YYYY-MM-DD`)
    #[arg(long)]
    backfill_start: Option<String>,

    /// Last backfilled day (`YYYYMMDD` or `YYYY-MM-DD`)
    #[arg(long)]
    backfill_end: Option<String>,

    /// Destination project
    #[arg(long)]
    destination_project: Option<String>,

    /// Destination dataset
    #[arg(long)]
    destination_dataset: Option<String>,

    /// Prints the plan on a single line
    #[arg(long)]
    compact: bool,
}

impl Args {
    fn request(&self) -> GenerationRequest {
        GenerationRequest {
            today: self.today.unwrap_or_else(|| Utc::now().date_naive()),
            initial_load: self.initial_load,
            property: self.property.clone(),
            overrides: RuntimeOverrides {
                backfill: match (self.backfill, self.no_backfill) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                backfill_start: self.backfill_start.clone(),
                backfill_end: self.backfill_end.clone(),
                destination_project: self.destination_project.clone(),
                destination_dataset: self.destination_dataset.clone(),
            },
        }
    }
}

fn parse_day(value: &str) -> Result<NaiveDate, String> {
    parse_date("today", value).map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match main_impl(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn main_impl(args: &Args) -> GeneratorResult<()> {
    let environment = Environment::load().map_err(GeneratorError::config)?;
    init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(GeneratorError::config)?;

    let client = load_client_config()?;
    let request = args.request();
    let units = run_generation(client, &request)?;

    info!(units = units.len(), %environment, "writing generation plan");

    write_units(&units, args.compact, io::stdout().lock())
}
