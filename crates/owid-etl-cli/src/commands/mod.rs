//! CLI command implementations.

pub mod inflation;
pub mod vaccination;

use std::path::Path;

use owid_etl::{HttpFetcher, PipelineConfig};
use tracing::debug;

/// Build the run configuration: defaults, then the config file, then `--root`.
pub fn load_config(
    root: Option<&Path>,
    config: Option<&Path>,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut loaded = match config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = root {
        loaded = loaded.with_root(root);
    }
    loaded.validate()?;
    debug!(root = %loaded.root.display(), "loaded configuration");
    Ok(loaded)
}

pub(crate) fn http_fetcher(
    config: &PipelineConfig,
) -> Result<HttpFetcher, Box<dyn std::error::Error>> {
    Ok(HttpFetcher::with_config(config.fetch.clone())?)
}
