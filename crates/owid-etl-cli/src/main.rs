//! owid-etl CLI - dataset pipelines for inflation and vaccination data.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use owid_etl::EtlError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = commands::load_config(cli.root.as_deref(), cli.config.as_deref()).and_then(
        |config| match cli.command {
            Commands::Inflation { stage } => commands::inflation::run(&config, stage, cli.json),
            Commands::Vaccination { stage } => {
                commands::vaccination::run(&config, stage, cli.json)
            }
        },
    );

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.downcast_ref::<EtlError>().is_some_and(EtlError::is_integrity_error) {
            eprintln!("Input data failed an integrity check; fix the source data or manifest and rerun.");
        }
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("owid_etl={0},owid_etl_cli={0}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
