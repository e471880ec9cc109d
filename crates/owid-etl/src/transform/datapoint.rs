//! Long-format records and the result of a reshape.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

/// One (entity, year) observation of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongDatapoint {
    /// Standardized entity name.
    #[serde(rename = "country")]
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

impl LongDatapoint {
    pub fn new(entity: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            entity: entity.into(),
            year,
            value,
        }
    }
}

/// Result of reshaping a wide table.
#[derive(Debug, Clone, Default)]
pub struct ReshapeOutcome {
    /// Datapoints per normalized variable name, sorted by name. Every entry
    /// has at least one datapoint.
    pub kept: IndexMap<String, Vec<LongDatapoint>>,

    /// Variables present in the input that produced no datapoints.
    pub excluded: BTreeSet<String>,

    /// Rows dropped because every year column was empty.
    pub empty_rows_dropped: usize,
}

impl ReshapeOutcome {
    /// Number of variables that will be written.
    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// Number of variables that produced nothing.
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Total datapoints across all kept variables.
    pub fn datapoint_count(&self) -> usize {
        self.kept.values().map(Vec::len).sum()
    }

    /// Distinct entities across all kept variables, sorted.
    pub fn entities(&self) -> BTreeSet<&str> {
        self.kept
            .values()
            .flatten()
            .map(|d| d.entity.as_str())
            .collect()
    }
}

/// Check the invariants every written partition must satisfy: unique
/// `(entity, year)` pairs, no empty entity names and only finite values.
pub fn validate_partition(variable: &str, datapoints: &[LongDatapoint]) -> Result<()> {
    let mut seen: HashSet<(&str, i32)> = HashSet::with_capacity(datapoints.len());

    for d in datapoints {
        if d.entity.trim().is_empty() {
            return Err(EtlError::NullValue(format!(
                "entity column of variable '{}'",
                variable
            )));
        }
        if !d.value.is_finite() {
            return Err(EtlError::NullValue(format!(
                "value column of variable '{}' ({}, {})",
                variable, d.entity, d.year
            )));
        }
        if !seen.insert((d.entity.as_str(), d.year)) {
            return Err(EtlError::DuplicateDatapoint {
                variable: variable.to_string(),
                entity: d.entity.clone(),
                year: d.year,
            });
        }
    }

    Ok(())
}
