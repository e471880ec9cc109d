//! Vaccination progress estimates.
//!
//! ```text
//! vaccinations.csv ──► VaccinationObservation ──┐
//!                                               ├──► RateProjectionEngine ──► LocationEstimate
//! population_latest.csv ──► PopulationReference ┘
//! ```

mod observation;
mod projection;
mod status;

pub use observation::{PopulationReference, VaccinationObservation};
pub use projection::{
    LocationProjection, ProjectionConfig, ProjectionOutcome, RateProjectionEngine, SkipReason,
    SkippedLocation,
};
pub use status::{DEFAULT_TARGET_PER_HUNDRED, EstimateStatus, LocationEstimate};
