//! Output and input directories that are fully replaced on each run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EtlError, Result};

/// A dataset's output directory.
#[derive(Debug, Clone)]
pub struct OutputArea {
    dir: PathBuf,
}

impl OutputArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact inside the output directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove everything in the output directory except the artifacts named
    /// in `preserve`, which are restored byte for byte. Names that do not
    /// exist are skipped.
    ///
    /// Not atomic: an interruption between removal and restore loses the
    /// preserved artifacts.
    pub fn reset(&self, preserve: &[&str]) -> Result<()> {
        let mut snapshots: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        for name in preserve {
            let path = self.dir.join(name);
            if path.is_file() {
                let bytes = fs::read(&path).map_err(|e| EtlError::io(&path, e))?;
                snapshots.push((path, bytes));
            }
        }

        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| EtlError::io(&self.dir, e))?;
        }
        fs::create_dir_all(&self.dir).map_err(|e| EtlError::io(&self.dir, e))?;

        for (path, bytes) in &snapshots {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
            }
            fs::write(path, bytes).map_err(|e| EtlError::io(path, e))?;
            debug!(file = %path.display(), "preserved across output reset");
        }

        info!(
            dir = %self.dir.display(),
            preserved = snapshots.len(),
            "reset output directory"
        );
        Ok(())
    }
}

/// A dataset's input directory. Wiped before every download.
#[derive(Debug, Clone)]
pub struct InputArea {
    dir: PathBuf,
}

impl InputArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove and recreate the input directory.
    pub fn reset(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| EtlError::io(&self.dir, e))?;
        }
        fs::create_dir_all(&self.dir).map_err(|e| EtlError::io(&self.dir, e))?;
        debug!(dir = %self.dir.display(), "reset input directory");
        Ok(())
    }
}
