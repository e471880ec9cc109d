//! CSV artifacts written by the pipelines.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::estimate::LocationEstimate;
use crate::input::DataTable;
use crate::names::partition_file_name;
use crate::transform::{LongDatapoint, ReshapeOutcome};

/// Subdirectory of the output area holding one CSV per variable.
pub const PARTITION_DIR: &str = "datapoints";
pub const DATASETS_FILE: &str = "datasets.csv";
pub const DISTINCT_ENTITIES_FILE: &str = "distinct_countries_standardized.csv";
pub const ESTIMATES_FILE: &str = "estimates.csv";

/// The single row of `datasets.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: u32,
    pub name: String,
}

/// Write one `datapoints_<variable>.csv` per kept variable into `dir`.
///
/// A partition file that already exists is an error: two variables must
/// never share a file.
pub fn write_partitions(dir: &Path, outcome: &ReshapeOutcome) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| EtlError::io(dir, e))?;

    let mut written = Vec::with_capacity(outcome.kept.len());
    for (variable, datapoints) in &outcome.kept {
        let path = dir.join(partition_file_name(variable));
        if path.exists() {
            return Err(EtlError::DuplicatePartition { path });
        }

        let mut writer = csv::Writer::from_path(&path)?;
        for d in datapoints {
            writer.serialize(d)?;
        }
        writer.flush().map_err(|e| EtlError::io(&path, e))?;

        debug!(file = %path.display(), rows = datapoints.len(), "wrote partition");
        written.push(path);
    }

    info!(partitions = written.len(), dir = %dir.display(), "wrote datapoints");
    Ok(written)
}

/// Read back every partition in `dir` and return the distinct entity names.
pub fn read_distinct_entities(dir: &Path) -> Result<BTreeSet<String>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| EtlError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("datapoints_") && n.ends_with(".csv"))
        })
        .collect();
    entries.sort();

    let mut entities = BTreeSet::new();
    for path in &entries {
        let mut reader = csv::Reader::from_path(path)?;
        for record in reader.deserialize::<LongDatapoint>() {
            let d = record?;
            if d.entity.trim().is_empty() {
                return Err(EtlError::NullValue(format!(
                    "country column of '{}'",
                    path.display()
                )));
            }
            entities.insert(d.entity);
        }
    }

    debug!(partitions = entries.len(), entities = entities.len(), "collected distinct entities");
    Ok(entities)
}

/// Write the sorted entity names with header `name`.
pub fn write_distinct_entities(path: &Path, entities: &BTreeSet<String>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["name"])?;
    for name in entities {
        if name.trim().is_empty() {
            return Err(EtlError::NullValue("distinct entity name".to_string()));
        }
        writer.write_record([name])?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;
    Ok(())
}

/// Write `datasets.csv`. It must hold exactly one row.
pub fn write_datasets(path: &Path, rows: &[DatasetSummary]) -> Result<()> {
    if rows.len() != 1 {
        return Err(EtlError::DatasetSummary(rows.len()));
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;
    Ok(())
}

/// Write `estimates.csv` with columns `Entity,Code,Year,status`.
pub fn write_estimates(path: &Path, estimates: &[LocationEstimate]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if estimates.is_empty() {
        writer.write_record(["Entity", "Code", "Year", "status"])?;
    }
    for estimate in estimates {
        writer.serialize(estimate)?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;
    info!(file = %path.display(), rows = estimates.len(), "wrote estimates");
    Ok(())
}

/// Write a parsed table back out as a plain comma-separated file.
pub fn write_table(path: &Path, table: &DataTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;
    Ok(())
}
