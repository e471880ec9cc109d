//! Wide-to-long reshape of entity × variable × year tables.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::entity::EntityStandardizer;
use crate::error::{EtlError, Result};
use crate::input::DataTable;
use crate::names::{is_year_column, normalize_name};

use super::datapoint::{LongDatapoint, ReshapeOutcome, validate_partition};

/// Column names the reshaper reads from a (header-normalized) wide table.
#[derive(Debug, Clone)]
pub struct ReshapeConfig {
    /// Column holding the raw entity code.
    pub entity_column: String,
    /// Column holding the variable name.
    pub variable_column: String,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            entity_column: "country_code".to_string(),
            variable_column: "series_name".to_string(),
        }
    }
}

/// A year column of the wide table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub index: usize,
    pub year: i32,
}

/// Converts wide rows (one column per year) into per-variable long records.
pub struct WideToLongReshaper<'a> {
    standardizer: &'a EntityStandardizer,
    config: ReshapeConfig,
}

impl<'a> WideToLongReshaper<'a> {
    /// Create a reshaper with the default column names.
    pub fn new(standardizer: &'a EntityStandardizer) -> Self {
        Self::with_config(standardizer, ReshapeConfig::default())
    }

    /// Create a reshaper with custom column names.
    pub fn with_config(standardizer: &'a EntityStandardizer, config: ReshapeConfig) -> Self {
        Self {
            standardizer,
            config,
        }
    }

    /// Year columns of `table` (headers of four ASCII digits), sorted by year.
    pub fn year_columns(table: &DataTable) -> Vec<YearColumn> {
        let mut years: Vec<YearColumn> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| is_year_column(h))
            .filter_map(|(index, h)| h.parse::<i32>().ok().map(|year| YearColumn { index, year }))
            .collect();
        years.sort_by_key(|c| c.year);
        years
    }

    /// Reshape every row of `table` using its detected year columns.
    pub fn reshape(&self, table: &DataTable) -> Result<ReshapeOutcome> {
        let years = Self::year_columns(table);
        self.reshape_with_years(table, &years)
    }

    /// Reshape `table` over an explicit set of year columns.
    ///
    /// Rows that are empty in every year column are dropped before entity
    /// names are resolved. Each remaining non-empty cell becomes one
    /// datapoint of its row's (normalized) variable. Variables left with no
    /// datapoints are reported as excluded.
    pub fn reshape_with_years(
        &self,
        table: &DataTable,
        years: &[YearColumn],
    ) -> Result<ReshapeOutcome> {
        let entity_idx = table.require_column("wide data", &self.config.entity_column)?;
        let variable_idx = table.require_column("wide data", &self.config.variable_column)?;

        let mut groups: IndexMap<String, BTreeMap<(String, i32), f64>> = IndexMap::new();
        let mut empty_rows_dropped = 0;

        for row in &table.rows {
            let variable = normalize_name(row[variable_idx].trim());
            let group = groups.entry(variable.clone()).or_default();

            let has_data = years
                .iter()
                .any(|c| !DataTable::is_null_value(&row[c.index]));
            if !has_data {
                empty_rows_dropped += 1;
                continue;
            }

            let entity = self.standardizer.standardize(&row[entity_idx])?;

            for column in years {
                let cell = &row[column.index];
                if DataTable::is_null_value(cell) {
                    continue;
                }
                let value = DataTable::parse_number(cell).ok_or_else(|| EtlError::NonNumeric {
                    variable: variable.clone(),
                    entity: entity.to_string(),
                    column: column.year.to_string(),
                    value: cell.clone(),
                })?;

                match group.entry((entity.to_string(), column.year)) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(_) => {
                        return Err(EtlError::DuplicateDatapoint {
                            variable,
                            entity: entity.to_string(),
                            year: column.year,
                        });
                    }
                }
            }
        }

        groups.sort_keys();

        let mut outcome = ReshapeOutcome {
            empty_rows_dropped,
            ..ReshapeOutcome::default()
        };

        for (variable, points) in groups {
            let datapoints: Vec<LongDatapoint> = points
                .into_iter()
                .map(|((entity, year), value)| LongDatapoint {
                    entity,
                    year,
                    value,
                })
                .collect();

            validate_partition(&variable, &datapoints)?;

            if datapoints.is_empty() {
                debug!(variable = %variable, "no datapoints; excluding variable");
                outcome.excluded.insert(variable);
            } else {
                debug!(variable = %variable, datapoints = datapoints.len(), "reshaped variable");
                outcome.kept.insert(variable, datapoints);
            }
        }

        info!(
            kept = outcome.kept_count(),
            excluded = outcome.excluded_count(),
            datapoints = outcome.datapoint_count(),
            dropped_rows = outcome.empty_rows_dropped,
            "reshaped wide table"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standardizer() -> EntityStandardizer {
        EntityStandardizer::from_pairs([("AFG", "Afghanistan"), ("ALB", "Albania")]).unwrap()
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn wide(rows: Vec<Vec<String>>) -> DataTable {
        DataTable::new(
            row(&["country_code", "series_name", "2021", "2019", "2020", "note"]),
            rows,
        )
    }

    #[test]
    fn test_year_columns_sorted() {
        let table = wide(vec![]);
        let years: Vec<i32> = WideToLongReshaper::year_columns(&table)
            .into_iter()
            .map(|c| c.year)
            .collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
    }

    #[test]
    fn test_reshape_skips_null_cells() {
        let s = standardizer();
        let table = wide(vec![row(&[
            "AFG",
            "Headline Consumer Price Inflation",
            "5.6",
            "2.3",
            "",
            "x",
        ])]);

        let outcome = WideToLongReshaper::new(&s).reshape(&table).unwrap();
        let points = &outcome.kept["headline_consumer_price_inflation"];
        assert_eq!(
            points,
            &vec![
                LongDatapoint::new("Afghanistan", 2019, 2.3),
                LongDatapoint::new("Afghanistan", 2021, 5.6),
            ]
        );
    }

    #[test]
    fn test_all_null_variable_is_excluded() {
        let s = standardizer();
        let table = wide(vec![
            row(&["AFG", "Energy", "", "", "", "x"]),
            row(&["ALB", "Energy", "NaN", "", "", "x"]),
            row(&["ALB", "Food", "1.0", "", "", ""]),
        ]);

        let outcome = WideToLongReshaper::new(&s).reshape(&table).unwrap();
        assert!(outcome.excluded.contains("energy"));
        assert!(!outcome.kept.contains_key("energy"));
        assert_eq!(outcome.kept_count(), 1);
        assert_eq!(outcome.empty_rows_dropped, 2);
    }

    #[test]
    fn test_all_null_row_with_unknown_entity_is_dropped_not_fatal() {
        let s = standardizer();
        let table = wide(vec![row(&["WLD", "Food", "", "", "", ""])]);
        let outcome = WideToLongReshaper::new(&s).reshape(&table).unwrap();
        assert!(outcome.excluded.contains("food"));
    }

    #[test]
    fn test_unknown_entity_with_data_is_fatal() {
        let s = standardizer();
        let table = wide(vec![row(&["WLD", "Food", "1.0", "", "", ""])]);
        assert!(matches!(
            WideToLongReshaper::new(&s).reshape(&table),
            Err(EtlError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_duplicate_entity_year_is_fatal() {
        let s = standardizer();
        let table = wide(vec![
            row(&["AFG", "Food", "1.0", "", "", ""]),
            row(&["AFG", "food", "2.0", "", "", ""]),
        ]);
        assert!(matches!(
            WideToLongReshaper::new(&s).reshape(&table),
            Err(EtlError::DuplicateDatapoint { year: 2021, .. })
        ));
    }

    #[test]
    fn test_non_numeric_cell_is_fatal() {
        let s = standardizer();
        let table = wide(vec![row(&["AFG", "Food", "high", "", "", ""])]);
        assert!(matches!(
            WideToLongReshaper::new(&s).reshape(&table),
            Err(EtlError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_variables_sorted_and_entities_unioned() {
        let s = standardizer();
        let table = wide(vec![
            row(&["ALB", "Zinc", "1.0", "", "", ""]),
            row(&["AFG", "Apples", "", "2.0", "", ""]),
            row(&["ALB", "Apples", "", "3.0", "", ""]),
        ]);
        let outcome = WideToLongReshaper::new(&s).reshape(&table).unwrap();
        let names: Vec<&String> = outcome.kept.keys().collect();
        assert_eq!(names, vec!["apples", "zinc"]);
        assert_eq!(
            outcome.entities().into_iter().collect::<Vec<_>>(),
            vec!["Afghanistan", "Albania"]
        );
    }
}
