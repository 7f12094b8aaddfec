use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to the configuration file")]
    pub config: Option<PathBuf>,
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the store data CSV file (overrides the configuration)"
    )]
    pub data: Option<PathBuf>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Show more log output")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Show how many stores have coordinates")]
    Status,
    #[command(about = "Look up the coordinates of stores and save them to the data file")]
    Geocode {
        #[arg(
            long,
            conflicts_with = "refresh",
            help = "Look up stores that still have no coordinates"
        )]
        resume: bool,
        #[arg(long, help = "Discard all coordinates and look up every store again")]
        refresh: bool,
    },
    #[command(about = "List stores")]
    List {
        #[arg(short, long, help = "Also show stores without coordinates")]
        all: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Show the map view of all stores with coordinates")]
    View {
        #[arg(
            long = "lat",
            requires = "longitude",
            allow_negative_numbers = true,
            help = "Latitude of your own location"
        )]
        latitude: Option<f64>,
        #[arg(
            long = "lon",
            requires = "latitude",
            allow_negative_numbers = true,
            help = "Longitude of your own location"
        )]
        longitude: Option<f64>,
    },
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    #[arg(short = 'o', long = "output", value_enum, default_value = "table")]
    pub(crate) format: OutputFormat,
}
