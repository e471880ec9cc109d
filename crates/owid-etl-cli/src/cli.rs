//! CLI argument definitions using clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// owid-etl: World Bank inflation and OWID vaccination pipelines
#[derive(Parser)]
#[command(name = "owid-etl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding one subdirectory per dataset (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// JSON configuration file; missing fields take defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the stage summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// World Bank Cross-Country Database of Inflation
    Inflation {
        #[command(subcommand)]
        stage: InflationStage,
    },

    /// OWID COVID-19 vaccination progress estimates
    Vaccination {
        #[command(subcommand)]
        stage: VaccinationStage,
    },
}

#[derive(Subcommand, Clone, Copy, Debug)]
pub enum InflationStage {
    /// Download the workbook and convert each sheet to a gzip CSV
    Download,

    /// Build variables_to_clean.json from the downloaded data
    InitVariables,

    /// Write per-variable datapoints and dataset metadata
    Clean,

    /// Download, initialise variables and clean
    Run,
}

#[derive(Subcommand, Clone, Copy, Debug)]
pub enum VaccinationStage {
    /// Download vaccination and population tables
    Download,

    /// Project progress and write estimates.csv
    Estimate,

    /// Download and estimate
    Run,
}
