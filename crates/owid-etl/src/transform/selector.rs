//! Filtering raw rows down to the variables listed in the manifest.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::input::DataTable;
use crate::manifest::VariableManifest;
use crate::names::normalize_name;

/// Keeps the rows whose normalized variable name is in an allow-list.
#[derive(Debug, Clone)]
pub struct VariableSelector {
    variable_column: String,
    names: BTreeSet<String>,
}

impl VariableSelector {
    /// Create a selector over `variable_column` accepting `names`.
    ///
    /// Names are normalized here as well, so raw and already-normalized
    /// allow-lists behave the same.
    pub fn new<I, S>(variable_column: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            variable_column: variable_column.into(),
            names: names.into_iter().map(|n| normalize_name(n.as_ref())).collect(),
        }
    }

    /// Create a selector accepting every variable in the manifest.
    pub fn from_manifest(manifest: &VariableManifest, variable_column: impl Into<String>) -> Self {
        Self {
            variable_column: variable_column.into(),
            names: manifest.normalized_names(),
        }
    }

    /// Returns true if a raw variable name is selected.
    pub fn accepts(&self, raw_name: &str) -> bool {
        self.names.contains(&normalize_name(raw_name))
    }

    /// Return a copy of `table` holding only the selected rows.
    pub fn select(&self, table: &DataTable) -> Result<DataTable> {
        let idx = table.require_column("raw data", &self.variable_column)?;
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .filter(|row| self.accepts(&row[idx]))
            .cloned()
            .collect();

        debug!(
            selected = rows.len(),
            total = table.row_count(),
            variables = self.names.len(),
            "selected manifest variables"
        );
        Ok(DataTable::new(table.headers.clone(), rows))
    }
}
