pub mod audit;
pub mod cli;
pub mod estimator;
pub mod ingest;
pub mod io_utils;
pub mod metrics;
pub mod record;
pub mod repair;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("cafe_sales", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Repair(args) => repair::execute(&args),
        Commands::Metrics(args) => metrics::execute(&args),
        Commands::Predict(args) => estimator::execute(&args),
        Commands::Audit(args) => audit::execute(&args),
    }
}
