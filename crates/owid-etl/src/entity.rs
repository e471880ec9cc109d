//! Mapping of source entity codes to standardized display names.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{EtlError, Result};
use crate::input::{DataTable, Parser};

/// Column holding the raw code in the lookup table.
pub const CODE_COLUMN: &str = "country_code";
/// Column holding the standardized name in the lookup table.
pub const NAME_COLUMN: &str = "standardized_name";

/// Resolves raw entity codes (e.g. `AFG`) to canonical names (`Afghanistan`).
///
/// The table is total over the codes that may appear in selected data: a
/// lookup miss is an error, never a silent drop.
#[derive(Debug, Clone, Default)]
pub struct EntityStandardizer {
    names: HashMap<String, String>,
}

impl EntityStandardizer {
    /// Build from explicit `(code, name)` pairs.
    pub fn from_pairs<I, C, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut names = HashMap::new();
        for (code, name) in pairs {
            let code = code.into();
            let name = name.into();
            if name.trim().is_empty() {
                return Err(EtlError::Config(format!(
                    "entity code '{}' has an empty standardized name",
                    code
                )));
            }
            if names.insert(code.clone(), name).is_some() {
                return Err(EtlError::Config(format!(
                    "entity code '{}' appears more than once in the lookup table",
                    code
                )));
            }
        }
        Ok(Self { names })
    }

    /// Build from a parsed lookup table with `country_code` and
    /// `standardized_name` columns.
    pub fn from_table(table: &DataTable) -> Result<Self> {
        let code_idx = table.require_column("standardized entity names", CODE_COLUMN)?;
        let name_idx = table.require_column("standardized entity names", NAME_COLUMN)?;

        Self::from_pairs(table.rows.iter().map(|row| {
            (
                row[code_idx].trim().to_string(),
                row[name_idx].trim().to_string(),
            )
        }))
    }

    /// Load the lookup table from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let (table, _) = Parser::new().parse_file(path.as_ref())?;
        let standardizer = Self::from_table(&table)?;
        debug!(
            entities = standardizer.len(),
            file = %path.as_ref().display(),
            "loaded standardized entity names"
        );
        Ok(standardizer)
    }

    /// Resolve a raw code to its standardized name.
    pub fn standardize(&self, code: &str) -> Result<&str> {
        self.names
            .get(code.trim())
            .map(String::as_str)
            .ok_or_else(|| EtlError::UnknownEntity {
                code: code.to_string(),
            })
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_known_code() {
        let s = EntityStandardizer::from_pairs([("AFG", "Afghanistan"), ("SSF", "Sub-Saharan Africa")])
            .unwrap();
        assert_eq!(s.standardize("AFG").unwrap(), "Afghanistan");
        assert_eq!(s.standardize(" SSF ").unwrap(), "Sub-Saharan Africa");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_unknown_code_is_error() {
        let s = EntityStandardizer::from_pairs([("AFG", "Afghanistan")]).unwrap();
        match s.standardize("XKX") {
            Err(EtlError::UnknownEntity { code }) => assert_eq!(code, "XKX"),
            other => panic!("expected UnknownEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let result = EntityStandardizer::from_pairs([("AFG", "Afghanistan"), ("AFG", "Afghan")]);
        assert!(matches!(result, Err(EtlError::Config(_))));
    }

    #[test]
    fn test_from_table_requires_columns() {
        let table = DataTable::new(vec!["code".into()], vec![vec!["AFG".into()]]);
        assert!(matches!(
            EntityStandardizer::from_table(&table),
            Err(EtlError::MissingColumn { .. })
        ));
    }
}
