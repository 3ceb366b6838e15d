mod cli;
mod commands;
mod config;
mod terminal;

use anyhow::Context;
use clap::Parser;
use engine_logging::engine_debug;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::from_args(&cli.global).context("invalid configuration")?;

    engine_logging::initialize(config.log_destination, config.log_level, &config.state_dir);
    engine_debug!("backend {} poll every {}ms", config.api_url, config.poll.interval_ms);

    commands::run(&config, cli.command)
}
