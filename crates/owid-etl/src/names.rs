//! Name normalization shared by every stage that compares variable names.
//!
//! Column headers, manifest entries, selection keys and partition file names
//! all go through [`normalize_name`]. Keeping a single implementation is what
//! guarantees that a variable written to the manifest is found again when the
//! raw data is filtered.

use once_cell::sync::Lazy;
use regex::Regex;

// Runs of whitespace, slashes or hyphens collapse to one underscore.
static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s/-]+").unwrap());

static YEAR_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

/// Normalize a raw name: lower-case it and collapse separator runs to `_`.
///
/// ```
/// use owid_etl::names::normalize_name;
///
/// assert_eq!(
///     normalize_name("Headline Consumer Price Inflation"),
///     "headline_consumer_price_inflation"
/// );
/// assert_eq!(normalize_name("Country Code"), "country_code");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    SEPARATOR_RUNS.replace_all(&lower, "_").into_owned()
}

/// Returns true if a (normalized) header names a year column.
pub fn is_year_column(header: &str) -> bool {
    YEAR_COLUMN.is_match(header)
}

/// File name of the datapoints partition for a normalized variable name.
pub fn partition_file_name(normalized_variable: &str) -> String {
    format!("datapoints_{}.csv", normalized_variable)
}
