//! Classification results of the projection.

use serde::{Deserialize, Serialize};

/// Target share (per hundred people) the published labels refer to by default.
pub const DEFAULT_TARGET_PER_HUNDRED: f64 = 70.0;

/// Progress of a location towards the vaccination target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimateStatus {
    /// Already reported at or above the target share.
    AboveTarget,
    /// Projected to stay below the target share by the target date.
    NotOnTrack,
    /// Projected to reach the target share by the target date.
    OnTrack,
}

impl EstimateStatus {
    /// Label written to the estimates file for a given target.
    ///
    /// ```
    /// use owid_etl::EstimateStatus;
    ///
    /// assert_eq!(
    ///     EstimateStatus::OnTrack.label(70.0),
    ///     "On track to 70% fully vaccinated"
    /// );
    /// assert_eq!(
    ///     EstimateStatus::AboveTarget.label(62.5),
    ///     "Already above 62.5% fully vaccinated"
    /// );
    /// ```
    pub fn label(&self, target_per_hundred: f64) -> String {
        let target = format_percent(target_per_hundred);
        match self {
            EstimateStatus::AboveTarget => format!("Already above {}% fully vaccinated", target),
            EstimateStatus::NotOnTrack => format!("Not on track to {}% fully vaccinated", target),
            EstimateStatus::OnTrack => format!("On track to {}% fully vaccinated", target),
        }
    }
}

impl std::fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label(DEFAULT_TARGET_PER_HUNDRED))
    }
}

// Whole percentages print without a fraction: "70", not "70.0".
fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// One row of `estimates.csv`.
///
/// `status` carries the classification; the CSV `status` column is the
/// label rendered for the target the location was classified against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationEstimate {
    #[serde(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "status")]
    pub label: String,
    #[serde(skip)]
    pub status: EstimateStatus,
}

impl LocationEstimate {
    pub fn new(
        entity: impl Into<String>,
        code: impl Into<String>,
        year: i32,
        status: EstimateStatus,
        target_per_hundred: f64,
    ) -> Self {
        Self {
            entity: entity.into(),
            code: code.into(),
            year,
            label: status.label(target_per_hundred),
            status,
        }
    }
}
