//! Vaccination command - download and progress estimation.

use colored::Colorize;
use owid_etl::{EstimateReport, EstimateStatus, PipelineConfig, VaccinationPipeline};

use crate::cli::VaccinationStage;

use super::http_fetcher;

pub fn run(
    config: &PipelineConfig,
    stage: VaccinationStage,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = http_fetcher(config)?;
    let pipeline = VaccinationPipeline::new(config, &fetcher);

    match stage {
        VaccinationStage::Download => {
            let files = pipeline.download()?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in &files {
                    println!("{} {}", "Saved".green().bold(), file.display());
                }
            }
        }
        VaccinationStage::Estimate => print_report(&pipeline.estimate()?, json_output)?,
        VaccinationStage::Run => print_report(&pipeline.run()?, json_output)?,
    }

    Ok(())
}

fn print_report(report: &EstimateReport, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        let summary = serde_json::json!({
            "file": report.path,
            "locations": report.estimates.len(),
            "by_status": report.status_counts(),
            "skipped": report.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} {} location(s) to {}",
        "Estimated".cyan().bold(),
        report.estimates.len(),
        report.path.display()
    );
    println!();
    println!(
        "  Already above target: {}",
        report.count(EstimateStatus::AboveTarget).to_string().green()
    );
    println!(
        "  On track:             {}",
        report.count(EstimateStatus::OnTrack).to_string().blue()
    );
    println!(
        "  Not on track:         {}",
        report.count(EstimateStatus::NotOnTrack).to_string().red()
    );

    if !report.skipped.is_empty() {
        println!();
        println!("{} {} location(s) not estimated", "Skipped".yellow().bold(), report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} ({}): {:?}", skipped.location, skipped.iso_code, skipped.reason);
        }
    }

    Ok(())
}
