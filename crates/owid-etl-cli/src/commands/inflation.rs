//! Inflation command - download, manifest initialisation and cleaning.

use colored::Colorize;
use owid_etl::{CleanReport, InflationPipeline, PipelineConfig};

use crate::cli::InflationStage;

use super::http_fetcher;

pub fn run(
    config: &PipelineConfig,
    stage: InflationStage,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = http_fetcher(config)?;
    let pipeline = InflationPipeline::new(config, &fetcher);
    let paths = pipeline.paths();

    match stage {
        InflationStage::Download => {
            let files = pipeline.download()?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                println!(
                    "{} {} sheet(s) into {}",
                    "Converted".green().bold(),
                    files.len(),
                    paths.input.display()
                );
            }
        }
        InflationStage::InitVariables => {
            let manifest = pipeline.init_variables()?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            } else {
                println!(
                    "{} {} variable(s) to {}",
                    "Wrote".green().bold(),
                    manifest.len(),
                    paths.output.join(owid_etl::manifest::MANIFEST_FILE).display()
                );
            }
        }
        InflationStage::Clean => print_report(&pipeline.clean()?, json_output)?,
        InflationStage::Run => print_report(&pipeline.run()?, json_output)?,
    }

    Ok(())
}

fn print_report(report: &CleanReport, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", "Inflation cleaning complete".cyan().bold());
    println!("  Manifest:   {}", report.manifest.display().to_string().white());
    println!("  Kept:       {}", report.kept_count().to_string().green());
    println!("  Excluded:   {}", report.excluded_count().to_string().yellow());
    println!("  Datapoints: {}", report.datapoints.to_string().white());
    println!("  Entities:   {}", report.entities.to_string().white());

    if !report.excluded.is_empty() {
        println!();
        println!("{}", "Excluded (no datapoints):".yellow().bold());
        for name in &report.excluded {
            println!("  - {}", name);
        }
    }

    Ok(())
}
