//! The manifest of source variables that become outputs.
//!
//! The manifest is generated once from a fresh raw pull and then consumed on
//! every cleaning run. Any variable not listed is ignored. It lives in the
//! output directory and must survive the output reset that precedes a clean.
//!
//! ```text
//! worldbank_inflation/
//! ├── config/variables_to_clean.json    # curated copy (preferred if present)
//! └── output/variables_to_clean.json    # generated copy
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::input::DataTable;
use crate::names::normalize_name;

/// File name of the manifest, in both the config and output directories.
pub const MANIFEST_FILE: &str = "variables_to_clean.json";

const DEFAULT_NOTES: &str = "This file contains an array of World Bank Inflation variables to \
     clean. Any variables NOT in this file will be ignored.";

/// Free-form information stored with the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMeta {
    pub notes: String,
}

/// One variable eligible for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestVariable {
    /// Variable name as it appears in the source.
    pub name: String,
}

/// Name-sorted, name-deduplicated list of variables to clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableManifest {
    pub meta: ManifestMeta,
    pub variables: Vec<ManifestVariable>,
}

impl VariableManifest {
    /// Build a manifest from variable names, deduplicated and sorted by name.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeMap<String, ManifestVariable> = names
            .into_iter()
            .map(Into::into)
            .map(|name| (name.clone(), ManifestVariable { name }))
            .collect();

        Self {
            meta: ManifestMeta {
                notes: DEFAULT_NOTES.to_string(),
            },
            variables: unique.into_values().collect(),
        }
    }

    /// Build a manifest from the distinct values of `variable_column` in a
    /// freshly downloaded table.
    pub fn from_table(table: &DataTable, variable_column: &str) -> Result<Self> {
        let idx = table.require_column("raw data", variable_column)?;
        let names = table
            .column_values(idx)
            .filter(|v| !DataTable::is_null_value(v))
            .map(str::to_string);
        let manifest = Self::from_names(names);
        info!(variables = manifest.len(), "built variable manifest");
        Ok(manifest)
    }

    /// Replace the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.meta.notes = notes.into();
        self
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if no variables are listed.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Raw variable names, in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// Normalized variable names, the form selection compares against.
    pub fn normalized_names(&self) -> BTreeSet<String> {
        self.names().map(normalize_name).collect()
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
            }
        }

        let file = File::create(path).map_err(|e| EtlError::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        debug!(file = %path.display(), variables = self.len(), "saved manifest");
        Ok(())
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        let manifest: VariableManifest = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                EtlError::Config(format!(
                    "Failed to parse manifest '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(manifest)
    }

    /// Load the curated manifest from `config_dir` if there is one, else the
    /// generated manifest from `output_dir`.
    pub fn load_preferred(config_dir: &Path, output_dir: &Path) -> Result<(Self, PathBuf)> {
        let curated = config_dir.join(MANIFEST_FILE);
        let path = if curated.exists() {
            curated
        } else {
            output_dir.join(MANIFEST_FILE)
        };
        let manifest = Self::load(&path)?;
        info!(file = %path.display(), variables = manifest.len(), "loaded variable manifest");
        Ok((manifest, path))
    }
}
