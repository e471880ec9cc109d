//! Stage orchestration for the two datasets.
//!
//! Each stage is a method taking the shared [`PipelineConfig`] and a
//! [`Fetcher`] by reference. Stages communicate only through files in the
//! dataset's `input/` and `output/` directories, so each can be rerun on
//! its own.
//!
//! ```text
//! inflation:   download ──► init_variables ──► clean
//! vaccination: download ──► estimate
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::{DatasetPaths, InflationConfig, PipelineConfig};
use crate::entity::EntityStandardizer;
use crate::error::Result;
use crate::estimate::{
    EstimateStatus, LocationEstimate, PopulationReference, RateProjectionEngine, SkipReason,
    SkippedLocation, VaccinationObservation,
};
use crate::fetch::Fetcher;
use crate::input::{DataTable, Parser, ParserConfig};
use crate::manifest::{MANIFEST_FILE, VariableManifest};
use crate::output::{
    DATASETS_FILE, DISTINCT_ENTITIES_FILE, DatasetSummary, ESTIMATES_FILE, InputArea,
    OutputArea, PARTITION_DIR, read_distinct_entities, write_datasets, write_distinct_entities,
    write_estimates, write_partitions, write_table,
};
use crate::transform::{ReshapeConfig, VariableSelector, WideToLongReshaper};
use crate::workbook::convert_workbook;

/// Entity lookup table in the dataset's config directory.
pub const ENTITY_NAMES_FILE: &str = "standardized_entity_names.csv";
pub const VACCINATIONS_FILE: &str = "vaccinations.csv";
pub const POPULATION_FILE: &str = "population_latest.csv";

/// Summary of a cleaning run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    /// Manifest the run selected variables from.
    pub manifest: PathBuf,
    pub partitions: Vec<PathBuf>,
    /// Variables that produced no datapoints.
    pub excluded: Vec<String>,
    pub datapoints: usize,
    pub entities: usize,
}

impl CleanReport {
    pub fn kept_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// Summary of an estimation run.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub path: PathBuf,
    pub estimates: Vec<LocationEstimate>,
    /// Recent locations left out of `estimates` because they could not be
    /// projected.
    pub skipped: Vec<SkippedLocation>,
}

impl EstimateReport {
    /// Number of locations per status.
    pub fn status_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.estimates {
            *counts.entry(e.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of locations with `status`.
    pub fn count(&self, status: EstimateStatus) -> usize {
        self.estimates.iter().filter(|e| e.status == status).count()
    }

    /// Number of skipped locations with `reason`.
    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// World Bank inflation: download, manifest initialisation and cleaning.
pub struct InflationPipeline<'a> {
    config: &'a PipelineConfig,
    fetcher: &'a dyn Fetcher,
}

impl<'a> InflationPipeline<'a> {
    pub fn new(config: &'a PipelineConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self { config, fetcher }
    }

    fn settings(&self) -> &InflationConfig {
        &self.config.inflation
    }

    pub fn paths(&self) -> DatasetPaths {
        self.config.inflation_paths()
    }

    /// Wipe the input directory, download the workbook and convert every
    /// sheet to a gzip CSV.
    pub fn download(&self) -> Result<Vec<PathBuf>> {
        let input = InputArea::new(self.paths().input);
        input.reset()?;

        let outcome = self.fetcher.fetch(&self.settings().file_url)?;
        info!(
            bytes = outcome.bytes.len(),
            complete = outcome.complete,
            "downloaded inflation workbook"
        );
        convert_workbook(&outcome.bytes, input.dir(), InflationConfig::sheet_file_name)
    }

    /// Load the raw table of the configured data series, headers normalized.
    pub fn load_raw(&self) -> Result<DataTable> {
        let path = self.paths().input.join(self.settings().raw_file_name());
        let (table, meta) = Parser::with_config(ParserConfig::normalized()).parse_file(&path)?;
        info!(
            file = %meta.file,
            rows = meta.row_count,
            hash = %meta.hash,
            "loaded raw inflation data"
        );
        Ok(table)
    }

    /// Build the variable manifest from the raw data and write it to a
    /// freshly reset output directory.
    pub fn init_variables(&self) -> Result<VariableManifest> {
        let raw = self.load_raw()?;
        let manifest = VariableManifest::from_table(&raw, &ReshapeConfig::default().variable_column)?;

        let output = OutputArea::new(self.paths().output);
        output.reset(&[])?;
        manifest.save(output.join(MANIFEST_FILE))?;
        Ok(manifest)
    }

    /// Reshape the manifest's variables into per-variable partitions and
    /// write the dataset metadata.
    pub fn clean(&self) -> Result<CleanReport> {
        let paths = self.paths();
        let output = OutputArea::new(&paths.output);
        output.reset(&[MANIFEST_FILE])?;

        let (manifest, manifest_path) = VariableManifest::load_preferred(&paths.config, &paths.output)?;
        let standardizer = EntityStandardizer::load(paths.config.join(ENTITY_NAMES_FILE))?;
        let raw = self.load_raw()?;

        let reshape = ReshapeConfig::default();
        let selected = VariableSelector::from_manifest(&manifest, &reshape.variable_column).select(&raw)?;
        let outcome = WideToLongReshaper::with_config(&standardizer, reshape).reshape(&selected)?;

        let partition_dir = output.join(PARTITION_DIR);
        let partitions = write_partitions(&partition_dir, &outcome)?;

        let datasets = vec![DatasetSummary {
            id: 0,
            name: self.settings().dataset_title(),
        }];
        write_datasets(&output.join(DATASETS_FILE), &datasets)?;

        let entities = read_distinct_entities(&partition_dir)?;
        write_distinct_entities(&output.join(DISTINCT_ENTITIES_FILE), &entities)?;

        info!(
            kept = partitions.len(),
            excluded = outcome.excluded_count(),
            entities = entities.len(),
            "cleaned {}",
            self.settings().namespace()
        );

        Ok(CleanReport {
            manifest: manifest_path,
            partitions,
            excluded: outcome.excluded.iter().cloned().collect(),
            datapoints: outcome.datapoint_count(),
            entities: entities.len(),
        })
    }

    /// Every stage in order.
    pub fn run(&self) -> Result<CleanReport> {
        self.download()?;
        self.init_variables()?;
        self.clean()
    }
}

/// OWID vaccinations: download and progress estimation.
pub struct VaccinationPipeline<'a> {
    config: &'a PipelineConfig,
    fetcher: &'a dyn Fetcher,
}

impl<'a> VaccinationPipeline<'a> {
    pub fn new(config: &'a PipelineConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn paths(&self) -> DatasetPaths {
        self.config.vaccination_paths()
    }

    /// Wipe the input directory and download both source tables, written
    /// back out through the CSV parser.
    pub fn download(&self) -> Result<Vec<PathBuf>> {
        let input = InputArea::new(self.paths().input);
        input.reset()?;

        let settings = &self.config.vaccination;
        let sources = [
            (settings.vaccinations_url.as_str(), VACCINATIONS_FILE),
            (settings.population_url.as_str(), POPULATION_FILE),
        ];

        let parser = Parser::new();
        let mut written = Vec::with_capacity(sources.len());
        for (url, file) in sources {
            let outcome = self.fetcher.fetch(url)?;
            let table = parser.parse_bytes(&outcome.bytes)?;
            let path = input.join(file);
            write_table(&path, &table)?;
            info!(file, rows = table.row_count(), complete = outcome.complete, "saved download");
            written.push(path);
        }
        Ok(written)
    }

    /// Project every location and write `estimates.csv`.
    pub fn estimate(&self) -> Result<EstimateReport> {
        let paths = self.paths();
        let settings = &self.config.vaccination;

        let output = OutputArea::new(&paths.output);
        output.reset(&[])?;

        let parser = Parser::new();
        let (vaccinations, _) = parser.parse_file(paths.input.join(VACCINATIONS_FILE))?;
        let (population, _) = parser.parse_file(paths.input.join(POPULATION_FILE))?;

        let observations = VaccinationObservation::from_table(&vaccinations)?;
        let population = PopulationReference::from_table(&population)?;

        let engine = RateProjectionEngine::with_config(settings.projection.clone()).with_year(settings.year);
        let outcome = engine.project_detailed(
            &observations,
            &population,
            settings.as_of_date,
            settings.target_date,
        )?;
        let estimates = engine.estimates(&outcome.projections, settings.target_date);

        let path = output.join(ESTIMATES_FILE);
        write_estimates(&path, &estimates)?;
        Ok(EstimateReport {
            path,
            estimates,
            skipped: outcome.skipped,
        })
    }

    /// Every stage in order.
    pub fn run(&self) -> Result<EstimateReport> {
        self.download()?;
        self.estimate()
    }
}
