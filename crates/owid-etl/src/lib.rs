//! owid-etl: tabular pipelines for two public statistical datasets.
//!
//! - **World Bank inflation**: a wide workbook (one column per year) is
//!   filtered to a manifest of variables, entity codes are mapped to
//!   standardized names, and each variable is written as a long-format
//!   `country,year,value` partition.
//! - **OWID vaccinations**: daily reporting is projected forward from a
//!   trailing-window rate, and every location is classified against a 70%
//!   target.
//!
//! Integrity violations (unknown entity codes, duplicate datapoints,
//! implausible estimates) stop a run with an [`EtlError`]; nothing partial
//! is published as if it were complete.
//!
//! # Example
//!
//! ```no_run
//! use owid_etl::{HttpFetcher, InflationPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default().with_root("data");
//! let fetcher = HttpFetcher::with_config(config.fetch.clone()).unwrap();
//! let report = InflationPipeline::new(&config, &fetcher).run().unwrap();
//!
//! println!("Partitions: {}", report.kept_count());
//! println!("Entities: {}", report.entities);
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod estimate;
pub mod fetch;
pub mod input;
pub mod manifest;
pub mod names;
pub mod output;
pub mod pipeline;
pub mod transform;
pub mod workbook;

pub use config::{DatasetPaths, FetchConfig, InflationConfig, PipelineConfig, VaccinationConfig};
pub use entity::EntityStandardizer;
pub use error::{EtlError, Result};
pub use estimate::{
    EstimateStatus, LocationEstimate, PopulationReference, ProjectionConfig, RateProjectionEngine,
    SkipReason, SkippedLocation, VaccinationObservation,
};
pub use fetch::{FetchOutcome, Fetcher, HttpFetcher, MockFetcher};
pub use input::{DataTable, Parser, SourceMetadata};
pub use manifest::VariableManifest;
pub use names::normalize_name;
pub use output::{DatasetSummary, InputArea, OutputArea};
pub use pipeline::{CleanReport, EstimateReport, InflationPipeline, VaccinationPipeline};
pub use transform::{LongDatapoint, ReshapeOutcome, VariableSelector, WideToLongReshaper};
