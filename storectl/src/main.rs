//! This is a command-line tool to look up and inspect the locations of stores via [libstore]
use crate::cli::*;
use anyhow::Result;
use clap::Parser;
use libstore::RecordStore;
use tracing::debug;
use tracing_subscriber::filter::EnvFilter;

mod cli;
mod commands;
mod config;
mod output;

const LOG_ENV_VAR: &str = "STOREMAP_LOG";

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    let cfg = config::Config::load(args.config.as_deref()).await?;
    let data_file = args.data.unwrap_or_else(|| cfg.data_file.clone());
    debug!(?data_file, "using store data");
    let store = RecordStore::new(data_file);

    match args.command {
        Commands::Status => commands::show::status(&store),
        Commands::Geocode { resume, refresh } => {
            commands::geocode::handle_command(&store, &cfg, resume, refresh).await
        }
        Commands::List { all, output } => commands::show::list(&store, all, output.format),
        Commands::View {
            latitude,
            longitude,
        } => commands::show::view(&store, latitude, longitude),
    }
}
