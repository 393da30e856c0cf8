pub mod anomaly;
pub mod classify;
pub mod cli;
pub mod dialect;
pub mod error;
pub mod io_utils;
pub mod prepare;
pub mod profile;
pub mod render;
pub mod report;
pub mod stats;
pub mod temporal;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::Cli;

static LOGGER: OnceLock<()> = OnceLock::new();

/// How a run ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The load script was generated.
    Completed,
    /// Structural anomalies stopped the run after the issue log was written.
    Halted,
}

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("loadprep", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<RunOutcome> {
    init_logging();
    let cli = Cli::parse();
    prepare::execute(&cli)
}
