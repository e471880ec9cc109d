//! Typed rows of the vaccination and population inputs.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EtlError, Result};
use crate::input::DataTable;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One day of vaccination reporting for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationObservation {
    pub location: String,
    pub iso_code: String,
    pub date: NaiveDate,
    pub daily_people_vaccinated: Option<f64>,
    pub people_vaccinated: Option<f64>,
    pub people_vaccinated_per_hundred: Option<f64>,
}

impl VaccinationObservation {
    /// Read observations from the OWID `vaccinations.csv` table.
    pub fn from_table(table: &DataTable) -> Result<Vec<Self>> {
        const TABLE: &str = "vaccinations";
        let location = table.require_column(TABLE, "location")?;
        let iso_code = table.require_column(TABLE, "iso_code")?;
        let date = table.require_column(TABLE, "date")?;
        let daily = table.require_column(TABLE, "daily_people_vaccinated")?;
        let people = table.require_column(TABLE, "people_vaccinated")?;
        let per_hundred = table.require_column(TABLE, "people_vaccinated_per_hundred")?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw_date = row[date].trim();
                let parsed = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
                    EtlError::Parse {
                        row: i + 1,
                        column: "date".to_string(),
                        message: format!("'{}': {}", raw_date, e),
                    }
                })?;

                Ok(Self {
                    location: row[location].trim().to_string(),
                    iso_code: row[iso_code].trim().to_string(),
                    date: parsed,
                    daily_people_vaccinated: DataTable::parse_number(&row[daily]),
                    people_vaccinated: DataTable::parse_number(&row[people]),
                    people_vaccinated_per_hundred: DataTable::parse_number(&row[per_hundred]),
                })
            })
            .collect()
    }
}

/// Population of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationReference {
    pub iso_code: String,
    pub population: f64,
}

impl PopulationReference {
    pub fn new(iso_code: impl Into<String>, population: f64) -> Self {
        Self {
            iso_code: iso_code.into(),
            population,
        }
    }

    /// Read the OWID `population_latest.csv` table. Rows without a code or
    /// a numeric population are skipped.
    pub fn from_table(table: &DataTable) -> Result<Vec<Self>> {
        const TABLE: &str = "population";
        let iso_code = table.require_column(TABLE, "iso_code")?;
        let population = table.require_column(TABLE, "population")?;

        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let code = row[iso_code].trim();
                if code.is_empty() {
                    return None;
                }
                DataTable::parse_number(&row[population]).map(|p| Self::new(code, p))
            })
            .collect())
    }

    /// Index references by code. The first entry for a code wins.
    pub fn index(references: &[Self]) -> HashMap<&str, f64> {
        let mut index = HashMap::with_capacity(references.len());
        for r in references {
            if index.contains_key(r.iso_code.as_str()) {
                warn!(iso_code = %r.iso_code, "duplicate population entry ignored");
                continue;
            }
            index.insert(r.iso_code.as_str(), r.population);
        }
        index
    }
}
