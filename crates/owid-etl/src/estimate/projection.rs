//! Trailing-window rate projection of vaccination progress.
//!
//! For each location the daily rate is averaged over the last
//! `window_days` of reporting, extended linearly to the target date, and
//! compared against the target share of the population.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EtlError, Result};

use super::observation::{PopulationReference, VaccinationObservation};
use super::status::{EstimateStatus, LocationEstimate};

/// Tuning of the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Length of the trailing window the rate is averaged over.
    pub window_days: i64,
    /// Locations whose last report is older than this (relative to the
    /// as-of date) are dropped unless already above target.
    pub stale_after_days: i64,
    /// Per-hundred value at which a location counts as above target.
    pub target_per_hundred: f64,
    /// Upper bound on a plausible projected share.
    pub max_share: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            window_days: 14,
            stale_after_days: 30,
            target_per_hundred: 70.0,
            max_share: 5.0,
        }
    }
}

impl ProjectionConfig {
    /// Target expressed as a share of the population.
    pub fn target_share(&self) -> f64 {
        self.target_per_hundred / 100.0
    }
}

/// Full detail of one projected location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProjection {
    pub location: String,
    pub iso_code: String,
    pub most_recent_date: NaiveDate,
    /// Mean daily people vaccinated over the trailing window.
    pub daily_rate: f64,
    pub people_vaccinated: f64,
    pub people_vaccinated_per_hundred: f64,
    pub projected_people_vaccinated: f64,
    pub population: f64,
    /// True when the population was derived from the per-hundred rate.
    pub population_derived: bool,
    pub estimated_share: f64,
    pub status: EstimateStatus,
}

impl LocationProjection {
    /// Reduce to the published estimate row, labelled for `target_per_hundred`.
    pub fn to_estimate(&self, year: i32, target_per_hundred: f64) -> LocationEstimate {
        LocationEstimate::new(
            self.location.clone(),
            self.iso_code.clone(),
            year,
            self.status,
            target_per_hundred,
        )
    }
}

/// Why a location still reporting within the staleness limit has no estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No `people_vaccinated` or per-hundred value anywhere in the window.
    MissingTotals,
    /// No population entry and a zero per-hundred rate to derive one from.
    UnknownPopulation,
}

/// A location left out of the estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLocation {
    pub location: String,
    pub iso_code: String,
    pub reason: SkipReason,
}

/// Result of projecting every location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionOutcome {
    pub projections: Vec<LocationProjection>,
    /// Recent locations that could not be projected. Stale locations are
    /// not listed.
    pub skipped: Vec<SkippedLocation>,
}

/// Window aggregate of one location before projection.
#[derive(Debug)]
struct WindowAggregate {
    most_recent_date: NaiveDate,
    rate_sum: f64,
    rate_count: usize,
    people_vaccinated: Option<f64>,
    per_hundred: Option<f64>,
}

/// Projects vaccination progress and classifies locations.
pub struct RateProjectionEngine {
    config: ProjectionConfig,
    year: Option<i32>,
}

impl RateProjectionEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(ProjectionConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: ProjectionConfig) -> Self {
        Self { config, year: None }
    }

    /// Year written on estimates. Defaults to the target date's year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Project every location and return one estimate per retained location.
    pub fn project(
        &self,
        observations: &[VaccinationObservation],
        population: &[PopulationReference],
        as_of: NaiveDate,
        target: NaiveDate,
    ) -> Result<Vec<LocationEstimate>> {
        let outcome = self.project_detailed(observations, population, as_of, target)?;
        Ok(self.estimates(&outcome.projections, target))
    }

    /// Published rows for `projections`, labelled with the configured target.
    pub fn estimates(&self, projections: &[LocationProjection], target: NaiveDate) -> Vec<LocationEstimate> {
        let year = self.year.unwrap_or_else(|| chrono::Datelike::year(&target));
        projections
            .iter()
            .map(|p| p.to_estimate(year, self.config.target_per_hundred))
            .collect()
    }

    /// Like [`project`](Self::project), keeping every intermediate value and
    /// the locations that could not be projected.
    pub fn project_detailed(
        &self,
        observations: &[VaccinationObservation],
        population: &[PopulationReference],
        as_of: NaiveDate,
        target: NaiveDate,
    ) -> Result<ProjectionOutcome> {
        let usable: Vec<&VaccinationObservation> = observations
            .iter()
            .filter(|o| o.daily_people_vaccinated.is_some())
            .filter(|o| o.date <= as_of)
            .filter(|o| !o.iso_code.is_empty())
            .collect();

        let mut most_recent: BTreeMap<&str, NaiveDate> = BTreeMap::new();
        for o in &usable {
            most_recent
                .entry(o.iso_code.as_str())
                .and_modify(|d| *d = (*d).max(o.date))
                .or_insert(o.date);
        }

        // Window rows in date order so "last" means latest.
        let mut window: Vec<&VaccinationObservation> = usable
            .into_iter()
            .filter(|o| {
                let latest = most_recent[o.iso_code.as_str()];
                (latest - o.date).num_days() < self.config.window_days
            })
            .collect();
        window.sort_by(|a, b| {
            (a.location.as_str(), a.date).cmp(&(b.location.as_str(), b.date))
        });

        let mut aggregates: BTreeMap<(&str, &str), WindowAggregate> = BTreeMap::new();
        for o in window {
            let latest = most_recent[o.iso_code.as_str()];
            let agg = aggregates
                .entry((o.location.as_str(), o.iso_code.as_str()))
                .or_insert(WindowAggregate {
                    most_recent_date: latest,
                    rate_sum: 0.0,
                    rate_count: 0,
                    people_vaccinated: None,
                    per_hundred: None,
                });
            if let Some(daily) = o.daily_people_vaccinated {
                agg.rate_sum += daily;
                agg.rate_count += 1;
            }
            if o.people_vaccinated.is_some() {
                agg.people_vaccinated = o.people_vaccinated;
            }
            if o.people_vaccinated_per_hundred.is_some() {
                agg.per_hundred = o.people_vaccinated_per_hundred;
            }
        }

        let populations = PopulationReference::index(population);
        let mut projections = Vec::with_capacity(aggregates.len());
        let mut skipped = Vec::new();
        let mut skip = |location: &str, iso_code: &str, reason| {
            skipped.push(SkippedLocation {
                location: location.to_string(),
                iso_code: iso_code.to_string(),
                reason,
            })
        };

        for ((location, iso_code), agg) in aggregates {
            let per_hundred_known = agg.per_hundred.unwrap_or(f64::NAN);
            let above_target = per_hundred_known >= self.config.target_per_hundred;
            let days_since_report = (as_of - agg.most_recent_date).num_days();
            if days_since_report > self.config.stale_after_days && !above_target {
                debug!(iso_code, days_since_report, "dropping stale location");
                continue;
            }

            let (Some(people_vaccinated), Some(per_hundred)) = (agg.people_vaccinated, agg.per_hundred)
            else {
                warn!(iso_code, "no cumulative totals in window; location not estimated");
                skip(location, iso_code, SkipReason::MissingTotals);
                continue;
            };

            let rate = agg.rate_sum / agg.rate_count as f64;
            let days_to_target = (target - agg.most_recent_date).num_days() as f64;
            let projected = people_vaccinated + rate * days_to_target;

            let (population, population_derived) = match populations.get(iso_code) {
                Some(&p) => (p, false),
                None => {
                    if per_hundred <= 0.0 {
                        warn!(
                            iso_code,
                            "population unknown and cannot be derived from a zero per-hundred rate; location not estimated"
                        );
                        skip(location, iso_code, SkipReason::UnknownPopulation);
                        continue;
                    }
                    warn!(iso_code, "population not found; deriving from per-hundred rate");
                    (people_vaccinated / (per_hundred / 100.0), true)
                }
            };

            let share = projected / population;
            if !(0.0..=self.config.max_share).contains(&share) {
                return Err(EtlError::ShareOutOfRange {
                    code: iso_code.to_string(),
                    share,
                    min: 0.0,
                    max: self.config.max_share,
                });
            }

            let status = self.classify(per_hundred, share);
            projections.push(LocationProjection {
                location: location.to_string(),
                iso_code: iso_code.to_string(),
                most_recent_date: agg.most_recent_date,
                daily_rate: rate,
                people_vaccinated,
                people_vaccinated_per_hundred: per_hundred,
                projected_people_vaccinated: projected,
                population,
                population_derived,
                estimated_share: share,
                status,
            });
        }

        info!(
            locations = projections.len(),
            derived_populations = projections.iter().filter(|p| p.population_derived).count(),
            skipped = skipped.len(),
            "projected vaccination progress"
        );
        Ok(ProjectionOutcome {
            projections,
            skipped,
        })
    }

    /// Classify a location. The reported per-hundred check takes precedence
    /// over the projected share.
    pub fn classify(&self, per_hundred: f64, estimated_share: f64) -> EstimateStatus {
        if per_hundred >= self.config.target_per_hundred {
            EstimateStatus::AboveTarget
        } else if estimated_share < self.config.target_share() {
            EstimateStatus::NotOnTrack
        } else {
            EstimateStatus::OnTrack
        }
    }
}

impl Default for RateProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn obs(
        iso: &str,
        d: &str,
        daily: Option<f64>,
        people: Option<f64>,
        per_hundred: Option<f64>,
    ) -> VaccinationObservation {
        VaccinationObservation {
            location: format!("Location {}", iso),
            iso_code: iso.to_string(),
            date: date(d),
            daily_people_vaccinated: daily,
            people_vaccinated: people,
            people_vaccinated_per_hundred: per_hundred,
        }
    }

    #[test]
    fn test_classification_precedence() {
        let engine = RateProjectionEngine::new();
        assert_eq!(engine.classify(75.0, 0.3), EstimateStatus::AboveTarget);
        assert_eq!(engine.classify(40.0, 0.3), EstimateStatus::NotOnTrack);
        assert_eq!(engine.classify(40.0, 0.7), EstimateStatus::OnTrack);
        assert_eq!(engine.classify(70.0, 0.1), EstimateStatus::AboveTarget);
    }

    #[test]
    fn test_window_excludes_older_rows() {
        // 2022-05-18 is exactly 14 days before 2022-06-01: outside the window.
        let observations = vec![
            obs("XYZ", "2022-05-18", Some(99_999.0), Some(1.0), Some(1.0)),
            obs("XYZ", "2022-05-19", Some(1000.0), Some(480_000.0), Some(48.0)),
            obs("XYZ", "2022-06-01", Some(1000.0), Some(500_000.0), Some(50.0)),
        ];
        let population = vec![PopulationReference::new("XYZ", 1_000_000.0)];

        let result = RateProjectionEngine::new()
            .project_detailed(&observations, &population, date("2022-06-01"), date("2022-07-01"))
            .unwrap()
            .projections;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].daily_rate, 1000.0);
        assert_eq!(result[0].people_vaccinated, 500_000.0);
    }

    #[test]
    fn test_last_skips_missing_cumulative_values() {
        let observations = vec![
            obs("XYZ", "2022-05-30", Some(10.0), Some(400.0), Some(40.0)),
            obs("XYZ", "2022-05-31", Some(20.0), None, None),
        ];
        let population = vec![PopulationReference::new("XYZ", 1000.0)];
        let result = RateProjectionEngine::new()
            .project_detailed(&observations, &population, date("2022-06-01"), date("2022-06-11"))
            .unwrap()
            .projections;

        assert_eq!(result[0].people_vaccinated, 400.0);
        assert_eq!(result[0].daily_rate, 15.0);
        assert_eq!(result[0].most_recent_date, date("2022-05-31"));
        // 400 + 15 * 11 = 565
        assert_eq!(result[0].projected_people_vaccinated, 565.0);
    }

    #[test]
    fn test_future_and_null_daily_rows_ignored() {
        let observations = vec![
            obs("XYZ", "2022-05-31", Some(10.0), Some(100.0), Some(10.0)),
            obs("XYZ", "2022-06-01", None, Some(999.0), Some(99.0)),
            obs("XYZ", "2022-06-05", Some(10_000.0), Some(900.0), Some(90.0)),
        ];
        let population = vec![PopulationReference::new("XYZ", 1000.0)];
        let result = RateProjectionEngine::new()
            .project_detailed(&observations, &population, date("2022-06-01"), date("2022-06-01"))
            .unwrap()
            .projections;

        assert_eq!(result[0].most_recent_date, date("2022-05-31"));
        assert_eq!(result[0].people_vaccinated, 100.0);
        assert_eq!(result[0].status, EstimateStatus::NotOnTrack);
    }

    #[test]
    fn test_stale_locations_dropped_unless_above_target() {
        let observations = vec![
            obs("OLD", "2022-01-01", Some(1.0), Some(10.0), Some(10.0)),
            obs("DONE", "2022-01-01", Some(1.0), Some(800.0), Some(80.0)),
        ];
        let population = vec![
            PopulationReference::new("OLD", 100.0),
            PopulationReference::new("DONE", 1000.0),
        ];
        let result = RateProjectionEngine::new()
            .project(&observations, &population, date("2022-04-01"), date("2022-07-01"))
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].code, "DONE");
        assert_eq!(result[0].status, EstimateStatus::AboveTarget);
        assert_eq!(result[0].year, 2022);
    }

    #[test]
    fn test_population_fallback() {
        let observations = vec![obs("ABC", "2022-03-31", Some(0.0), Some(500.0), Some(50.0))];
        let result = RateProjectionEngine::new()
            .project_detailed(&observations, &[], date("2022-04-01"), date("2022-07-01"))
            .unwrap()
            .projections;

        assert!(result[0].population_derived);
        assert_eq!(result[0].population, 1000.0);
        assert_eq!(result[0].estimated_share, 0.5);
    }

    #[test]
    fn test_zero_per_hundred_without_population_is_skipped() {
        let observations = vec![obs("ABC", "2022-03-31", Some(0.0), Some(0.0), Some(0.0))];
        let outcome = RateProjectionEngine::new()
            .project_detailed(&observations, &[], date("2022-04-01"), date("2022-07-01"))
            .unwrap();
        assert!(outcome.projections.is_empty());
        assert_eq!(outcome.skipped[0].reason, SkipReason::UnknownPopulation);
    }

    #[test]
    fn test_missing_totals_reported_as_skipped() {
        let observations = vec![obs("NUL", "2022-03-31", Some(100.0), None, None)];
        let population = vec![PopulationReference::new("NUL", 1000.0)];
        let outcome = RateProjectionEngine::new()
            .project_detailed(&observations, &population, date("2022-04-01"), date("2022-07-01"))
            .unwrap();

        assert!(outcome.projections.is_empty());
        assert_eq!(
            outcome.skipped,
            vec![SkippedLocation {
                location: "Location NUL".to_string(),
                iso_code: "NUL".to_string(),
                reason: SkipReason::MissingTotals,
            }]
        );
    }

    #[test]
    fn test_staleness_boundary() {
        // Last report 30 days before as-of is kept, 31 days is dropped.
        let observations = vec![
            obs("D30", "2022-03-02", Some(1.0), Some(100.0), Some(10.0)),
            obs("D31", "2022-03-01", Some(1.0), Some(100.0), Some(10.0)),
        ];
        let population = vec![
            PopulationReference::new("D30", 1000.0),
            PopulationReference::new("D31", 1000.0),
        ];
        let outcome = RateProjectionEngine::new()
            .project_detailed(&observations, &population, date("2022-04-01"), date("2022-07-01"))
            .unwrap();

        let codes: Vec<&str> = outcome.projections.iter().map(|p| p.iso_code.as_str()).collect();
        assert_eq!(codes, vec!["D30"]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_configured_target_drives_labels() {
        let engine = RateProjectionEngine::with_config(ProjectionConfig {
            target_per_hundred: 80.0,
            ..ProjectionConfig::default()
        });
        assert_eq!(engine.classify(75.0, 0.75), EstimateStatus::NotOnTrack);
        assert_eq!(engine.classify(85.0, 0.1), EstimateStatus::AboveTarget);

        let observations = vec![
            obs("HIG", "2022-03-31", Some(1.0), Some(850.0), Some(85.0)),
            obs("MID", "2022-03-31", Some(0.0), Some(750.0), Some(75.0)),
        ];
        let population = vec![
            PopulationReference::new("HIG", 1000.0),
            PopulationReference::new("MID", 1000.0),
        ];
        let estimates = engine
            .project(&observations, &population, date("2022-04-01"), date("2022-07-01"))
            .unwrap();

        assert_eq!(estimates[0].label, "Already above 80% fully vaccinated");
        assert_eq!(estimates[1].status, EstimateStatus::NotOnTrack);
        assert_eq!(estimates[1].label, "Not on track to 80% fully vaccinated");
    }

    #[test]
    fn test_share_out_of_range_is_fatal() {
        let observations = vec![obs("BIG", "2022-03-31", Some(1000.0), Some(100.0), Some(10.0))];
        let population = vec![PopulationReference::new("BIG", 100.0)];
        let result = RateProjectionEngine::new().project(
            &observations,
            &population,
            date("2022-04-01"),
            date("2022-07-01"),
        );
        assert!(matches!(result, Err(EtlError::ShareOutOfRange { .. })));
    }

    #[test]
    fn test_explicit_year() {
        let observations = vec![obs("ABC", "2022-03-31", Some(1.0), Some(10.0), Some(1.0))];
        let population = vec![PopulationReference::new("ABC", 1000.0)];
        let result = RateProjectionEngine::new()
            .with_year(2021)
            .project(&observations, &population, date("2022-04-01"), date("2022-07-01"))
            .unwrap();
        assert_eq!(result[0].year, 2021);
    }
}
