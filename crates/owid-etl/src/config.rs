//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is built once at startup (defaults, optionally
//! overridden from a JSON file) and passed by reference to every stage.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};
use crate::estimate::ProjectionConfig;

/// Top-level configuration for both dataset pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory that holds one subdirectory per dataset.
    pub root: PathBuf,
    /// World Bank inflation dataset settings.
    pub inflation: InflationConfig,
    /// COVID-19 vaccination dataset settings.
    pub vaccination: VaccinationConfig,
    /// Download behavior shared by both datasets.
    pub fetch: FetchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            inflation: InflationConfig::default(),
            vaccination: VaccinationConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EtlError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the root directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Check values that would otherwise surface as confusing failures later.
    pub fn validate(&self) -> Result<()> {
        let v = &self.vaccination;
        if v.target_date < v.as_of_date {
            return Err(EtlError::Config(format!(
                "target date {} is before as-of date {}",
                v.target_date, v.as_of_date
            )));
        }
        if v.projection.window_days <= 0 {
            return Err(EtlError::Config(
                "projection window must be at least one day".to_string(),
            ));
        }
        if self.fetch.chunk_size == 0 {
            return Err(EtlError::Config("fetch chunk size must be non-zero".to_string()));
        }
        if self.inflation.data_series.trim().is_empty() {
            return Err(EtlError::Config("inflation data series is empty".to_string()));
        }
        Ok(())
    }

    /// Directory layout of the inflation dataset.
    pub fn inflation_paths(&self) -> DatasetPaths {
        DatasetPaths::under(&self.root, &self.inflation.dataset_dir)
    }

    /// Directory layout of the vaccination dataset.
    pub fn vaccination_paths(&self) -> DatasetPaths {
        DatasetPaths::under(&self.root, &self.vaccination.dataset_dir)
    }
}

/// The `config/`, `input/` and `output/` directories of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Hand-maintained files (entity names, curated manifest).
    pub config: PathBuf,
    /// Raw downloads. Wiped before each download.
    pub input: PathBuf,
    /// Generated outputs. Wiped before each run.
    pub output: PathBuf,
}

impl DatasetPaths {
    /// Layout rooted at `root/dataset_dir`.
    pub fn under(root: &Path, dataset_dir: &str) -> Self {
        let base = root.join(dataset_dir);
        Self {
            config: base.join("config"),
            input: base.join("input"),
            output: base.join("output"),
        }
    }
}

/// World Bank Cross-Country Database of Inflation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InflationConfig {
    pub dataset_name: String,
    pub authors: String,
    pub version: String,
    pub link: String,
    /// Workbook download URL.
    pub file_url: String,
    /// Workbook sheet to clean (e.g. `hcpi_a`, annual headline CPI).
    pub data_series: String,
    /// Date the source was retrieved, as published in the metadata.
    pub retrieved_date: String,
    pub dataset_dir: String,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            dataset_name: "World Bank Cross-Country Database of Inflation".to_string(),
            authors: "World Bank".to_string(),
            version: "June 2021".to_string(),
            link: "https://www.worldbank.org/en/research/brief/inflation-database".to_string(),
            file_url: "https://thedocs.worldbank.org/en/doc/1ad246272dbbc437c74323719506aa0c-0350012021/original/Inflation-data.xlsx".to_string(),
            data_series: "hcpi_a".to_string(),
            retrieved_date: "02-March-2022".to_string(),
            dataset_dir: "worldbank_inflation".to_string(),
        }
    }
}

impl InflationConfig {
    /// Display name used for the single row of `datasets.csv`.
    pub fn dataset_title(&self) -> String {
        format!("{} - {} ({})", self.dataset_name, self.authors, self.version)
    }

    /// Namespace of the dataset (`<dir>@<version>`).
    pub fn namespace(&self) -> String {
        format!("{}@{}", self.dataset_dir, self.version)
    }

    /// Input file name of a converted workbook sheet.
    pub fn sheet_file_name(sheet: &str) -> String {
        format!("WorldBankInflation{}.csv.zip", sheet)
    }

    /// Input file name of the configured data series.
    pub fn raw_file_name(&self) -> String {
        Self::sheet_file_name(&self.data_series)
    }
}

/// OWID COVID-19 vaccination estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccinationConfig {
    pub vaccinations_url: String,
    pub population_url: String,
    /// Observations after this date are ignored.
    pub as_of_date: NaiveDate,
    /// Date the projection targets.
    pub target_date: NaiveDate,
    /// Value written to the `Year` column of the estimates.
    pub year: i32,
    pub projection: ProjectionConfig,
    pub dataset_dir: String,
}

impl Default for VaccinationConfig {
    fn default() -> Self {
        Self {
            vaccinations_url: "https://raw.githubusercontent.com/owid/covid-19-data/master/public/data/vaccinations/vaccinations.csv".to_string(),
            population_url: "https://raw.githubusercontent.com/owid/covid-19-data/master/scripts/input/un/population_latest.csv".to_string(),
            as_of_date: NaiveDate::from_ymd_opt(2022, 4, 1).unwrap_or_default(),
            target_date: NaiveDate::from_ymd_opt(2022, 7, 1).unwrap_or_default(),
            year: 2022,
            projection: ProjectionConfig::default(),
            dataset_dir: "covid_calculations".to_string(),
        }
    }
}

/// Download behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Resume attempts after an interrupted transfer.
    pub max_retries: u32,
    /// Read buffer size while streaming a body.
    pub chunk_size: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            chunk_size: 8192,
            timeout_secs: 300,
        }
    }
}
