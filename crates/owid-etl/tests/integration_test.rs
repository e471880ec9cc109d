//! Integration tests for the owid-etl pipelines.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use owid_etl::estimate::{EstimateStatus, SkipReason};
use owid_etl::manifest::MANIFEST_FILE;
use owid_etl::pipeline::ENTITY_NAMES_FILE;
use owid_etl::workbook::write_gzip_csv;
use owid_etl::{
    EtlError, InflationPipeline, MockFetcher, PipelineConfig, PopulationReference,
    RateProjectionEngine, VaccinationObservation, VaccinationPipeline, VariableManifest,
};

/// Helper to turn string literals into a row.
fn row(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lay out a raw inflation pull and entity table under `config`'s root.
fn seed_inflation(config: &PipelineConfig, extra_rows: Vec<Vec<String>>) {
    let paths = config.inflation_paths();
    fs::create_dir_all(&paths.input).unwrap();

    let mut rows = vec![
        row(&["Country Code", "IMF Country Code", "Country", "Series Name", "1970", "1971", "2020", "Note"]),
        row(&["AFG", "512", "Afghanistan", "Headline Consumer Price Inflation", "2.5", "", "5.6", ""]),
        row(&["ALB", "914", "Albania", "Headline Consumer Price Inflation", "", "", "1.6", ""]),
        row(&["WLD", "", "World", "Headline Consumer Price Inflation", "", "", "", "aggregate"]),
        row(&["AFG", "512", "Afghanistan", "Energy Price Inflation", "", "", "", ""]),
    ];
    rows.extend(extra_rows);
    write_gzip_csv(&paths.input.join(config.inflation.raw_file_name()), &rows).unwrap();

    write_file(
        &paths.config.join(ENTITY_NAMES_FILE),
        "country_code,standardized_name\nAFG,Afghanistan\nALB,Albania\n",
    );
}

// =============================================================================
// Inflation Pipeline Tests
// =============================================================================

#[test]
fn test_init_variables_writes_sorted_manifest() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(&config, vec![]);

    let fetcher = MockFetcher::new();
    let manifest = InflationPipeline::new(&config, &fetcher)
        .init_variables()
        .expect("init failed");

    assert_eq!(
        manifest.names().collect::<Vec<_>>(),
        vec!["Energy Price Inflation", "Headline Consumer Price Inflation"]
    );

    let saved = VariableManifest::load(config.inflation_paths().output.join(MANIFEST_FILE)).unwrap();
    assert_eq!(saved, manifest);
}

#[test]
fn test_clean_writes_partitions_and_metadata() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(&config, vec![]);

    let fetcher = MockFetcher::new();
    let pipeline = InflationPipeline::new(&config, &fetcher);
    pipeline.init_variables().unwrap();

    // Left over from an earlier run; must not survive the reset.
    let output = config.inflation_paths().output;
    write_file(&output.join("datapoints/datapoints_stale.csv"), "country,year,value\n");

    let report = pipeline.clean().expect("clean failed");

    assert_eq!(report.kept_count(), 1);
    assert_eq!(report.excluded, vec!["energy_price_inflation".to_string()]);
    assert_eq!(report.datapoints, 3);
    assert_eq!(report.entities, 2);
    assert_eq!(report.manifest, output.join(MANIFEST_FILE));

    assert_eq!(
        fs::read_to_string(output.join("datapoints/datapoints_headline_consumer_price_inflation.csv"))
            .unwrap(),
        "country,year,value\nAfghanistan,1970,2.5\nAfghanistan,2020,5.6\nAlbania,2020,1.6\n"
    );
    assert!(!output.join("datapoints/datapoints_stale.csv").exists());
    assert!(!output.join("datapoints/datapoints_energy_price_inflation.csv").exists());
    assert_eq!(
        fs::read_to_string(output.join("datasets.csv")).unwrap(),
        "id,name\n0,World Bank Cross-Country Database of Inflation - World Bank (June 2021)\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("distinct_countries_standardized.csv")).unwrap(),
        "name\nAfghanistan\nAlbania\n"
    );
    assert!(output.join(MANIFEST_FILE).exists());
}

#[test]
fn test_clean_prefers_curated_manifest() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(&config, vec![]);

    let fetcher = MockFetcher::new();
    let pipeline = InflationPipeline::new(&config, &fetcher);
    pipeline.init_variables().unwrap();

    let curated = config.inflation_paths().config.join(MANIFEST_FILE);
    VariableManifest::from_names(["Energy Price Inflation"])
        .save(&curated)
        .unwrap();

    let report = pipeline.clean().unwrap();
    assert_eq!(report.manifest, curated);
    assert_eq!(report.kept_count(), 0);
    assert_eq!(report.entities, 0);
    assert_eq!(
        fs::read_to_string(
            config
                .inflation_paths()
                .output
                .join("distinct_countries_standardized.csv")
        )
        .unwrap(),
        "name\n"
    );
}

#[test]
fn test_clean_fails_on_unknown_entity_with_data() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(
        &config,
        vec![row(&["XKX", "967", "Kosovo", "Headline Consumer Price Inflation", "1.0", "", "", ""])],
    );

    let fetcher = MockFetcher::new();
    let pipeline = InflationPipeline::new(&config, &fetcher);
    pipeline.init_variables().unwrap();

    match pipeline.clean() {
        Err(EtlError::UnknownEntity { code }) => assert_eq!(code, "XKX"),
        other => panic!("expected unknown entity error, got {:?}", other),
    }
}

#[test]
fn test_clean_without_manifest_fails() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(&config, vec![]);

    let fetcher = MockFetcher::new();
    assert!(InflationPipeline::new(&config, &fetcher).clean().is_err());
}

#[test]
fn test_download_rejects_non_workbook_and_wipes_input() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    seed_inflation(&config, vec![]);

    let fetcher = MockFetcher::new().with_body(config.inflation.file_url.clone(), "not a workbook");
    let result = InflationPipeline::new(&config, &fetcher).download();

    assert!(matches!(result, Err(EtlError::Workbook(_))));
    let input = config.inflation_paths().input;
    assert!(input.is_dir());
    assert!(!input.join(config.inflation.raw_file_name()).exists());
}

// =============================================================================
// Vaccination Pipeline Tests
// =============================================================================

const VACCINATIONS: &str = "\
location,iso_code,date,total_vaccinations,people_vaccinated,daily_people_vaccinated,people_vaccinated_per_hundred
Xyzland,XYZ,2022-03-31,,399000,1000,39.9
Xyzland,XYZ,2022-04-01,,400000,1000,40.0
Xyzland,XYZ,2022-04-02,,,999999,
Fastland,FST,2022-04-01,,500000,10000,50.0
Highland,HIG,2022-04-01,,800,10,80.0
Staleland,STL,2022-01-01,,100,5,10.0
Nopopland,NOP,2022-04-01,,300,0,30.0
";

const POPULATION: &str = "\
entity,year,iso_code,population
Xyzland,2021,XYZ,1000000
Fastland,2021,FST,1000000
Highland,2021,HIG,1000
Staleland,2021,STL,1000
";

fn vaccination_fetcher(config: &PipelineConfig) -> MockFetcher {
    MockFetcher::new()
        .with_body(config.vaccination.vaccinations_url.clone(), VACCINATIONS)
        .with_body(config.vaccination.population_url.clone(), POPULATION)
}

#[test]
fn test_vaccination_run_writes_estimates() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    let fetcher = vaccination_fetcher(&config);

    let report = VaccinationPipeline::new(&config, &fetcher)
        .run()
        .expect("vaccination run failed");

    assert_eq!(report.estimates.len(), 4);
    assert_eq!(report.count(EstimateStatus::NotOnTrack), 2);
    assert_eq!(
        fs::read_to_string(&report.path).unwrap(),
        "Entity,Code,Year,status\n\
         Fastland,FST,2022,On track to 70% fully vaccinated\n\
         Highland,HIG,2022,Already above 70% fully vaccinated\n\
         Nopopland,NOP,2022,Not on track to 70% fully vaccinated\n\
         Xyzland,XYZ,2022,Not on track to 70% fully vaccinated\n"
    );

    let input = config.vaccination_paths().input;
    assert!(input.join("vaccinations.csv").exists());
    assert!(input.join("population_latest.csv").exists());
}

#[test]
fn test_vaccination_estimate_with_custom_target() {
    let root = TempDir::new().unwrap();
    let mut config = PipelineConfig::default().with_root(root.path());
    config.vaccination.projection.target_per_hundred = 80.0;

    let vaccinations = format!("{}Blankland,BLK,2022-04-01,,,50,\n", VACCINATIONS);
    let fetcher = MockFetcher::new()
        .with_body(config.vaccination.vaccinations_url.clone(), vaccinations)
        .with_body(config.vaccination.population_url.clone(), POPULATION);

    let report = VaccinationPipeline::new(&config, &fetcher)
        .run()
        .expect("vaccination run failed");

    assert_eq!(
        fs::read_to_string(&report.path).unwrap(),
        "Entity,Code,Year,status\n\
         Fastland,FST,2022,On track to 80% fully vaccinated\n\
         Highland,HIG,2022,Already above 80% fully vaccinated\n\
         Nopopland,NOP,2022,Not on track to 80% fully vaccinated\n\
         Xyzland,XYZ,2022,Not on track to 80% fully vaccinated\n"
    );
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].iso_code, "BLK");
    assert_eq!(report.skipped_count(SkipReason::MissingTotals), 1);
}

#[test]
fn test_vaccination_download_resumes_interrupted_transfer() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    let url = config.vaccination.vaccinations_url.clone();
    let fetcher = vaccination_fetcher(&config).with_interruptions(url.clone(), 2, 100);

    let pipeline = VaccinationPipeline::new(&config, &fetcher);
    pipeline.download().unwrap();

    let offsets: Vec<u64> = fetcher
        .requests()
        .into_iter()
        .filter(|(u, _)| *u == url)
        .map(|(_, offset)| offset)
        .collect();
    assert_eq!(offsets, vec![0, 100, 200]);

    let saved = fs::read_to_string(config.vaccination_paths().input.join("vaccinations.csv")).unwrap();
    assert_eq!(saved.lines().count(), VACCINATIONS.lines().count());
}

#[test]
fn test_vaccination_estimate_rejects_implausible_share() {
    let root = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_root(root.path());
    let fetcher = MockFetcher::new()
        .with_body(
            config.vaccination.vaccinations_url.clone(),
            "location,iso_code,date,people_vaccinated,daily_people_vaccinated,people_vaccinated_per_hundred\n\
             Tinyland,TNY,2022-04-01,10,100,1.0\n",
        )
        .with_body(
            config.vaccination.population_url.clone(),
            "iso_code,population\nTNY,100\n",
        );

    let result = VaccinationPipeline::new(&config, &fetcher).run();
    assert!(matches!(result, Err(EtlError::ShareOutOfRange { .. })));
}

// =============================================================================
// Projection Engine Tests
// =============================================================================

#[test]
fn test_projection_worked_example() {
    let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    let observations: Vec<VaccinationObservation> = (0..14)
        .map(|i| {
            let day = date("2022-05-19") + chrono::Duration::days(i);
            let last = i == 13;
            VaccinationObservation {
                location: "Xyzland".to_string(),
                iso_code: "XYZ".to_string(),
                date: day,
                daily_people_vaccinated: Some(1000.0),
                people_vaccinated: last.then_some(500_000.0),
                people_vaccinated_per_hundred: last.then_some(50.0),
            }
        })
        .collect();
    let population = vec![PopulationReference::new("XYZ", 1_000_000.0)];

    let projections = RateProjectionEngine::new()
        .project_detailed(&observations, &population, date("2022-06-01"), date("2022-07-01"))
        .unwrap()
        .projections;

    assert_eq!(projections.len(), 1);
    let p = &projections[0];
    assert_eq!(p.most_recent_date, date("2022-06-01"));
    assert_eq!(p.daily_rate, 1000.0);
    assert_eq!(p.projected_people_vaccinated, 530_000.0);
    assert!((p.estimated_share - 0.53).abs() < 1e-12);
    assert_eq!(p.status, EstimateStatus::NotOnTrack);
}
