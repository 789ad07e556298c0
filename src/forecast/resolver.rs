use chrono::{Days, NaiveDate, NaiveTime};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::artifacts::{ArtifactStore, ForecastArtifact};
use super::catalog::ReferenceCatalog;
use super::params::ForecastParams;
use crate::domain::{end_of_day, EnergyTotals, GeoPoint, ReferenceLocation, SubRange, TICK};
use crate::ml::ForecastModel;
use crate::report::{ReportError, ReportResult, Stage};

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Forecast contributions for the future side of a report
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub location: ReferenceLocation,
    pub totals: HashMap<String, EnergyTotals>,
}

/// Picks the reference location nearest to the caller, loads its artifact
/// and turns daily predictions into energy totals.
pub struct ForecastResolver {
    catalog: ReferenceCatalog,
    artifacts: Arc<dyn ArtifactStore>,
    load_timeout: Duration,
}

impl ForecastResolver {
    pub fn new(
        catalog: ReferenceCatalog,
        artifacts: Arc<dyn ArtifactStore>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            artifacts,
            load_timeout,
        }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn resolve_location(&self, point: GeoPoint) -> ReportResult<&ReferenceLocation> {
        self.catalog
            .nearest(point)
            .ok_or(ReportError::LocationUnresolved)
    }

    pub async fn load_artifact(
        &self,
        location: &ReferenceLocation,
    ) -> ReportResult<Arc<ForecastArtifact>> {
        let key = location.key();
        match tokio::time::timeout(self.load_timeout, self.artifacts.load(&key)).await {
            Err(_) => Err(ReportError::ArtifactLoadTimeout {
                key: key.to_string(),
                secs: self.load_timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(ReportError::store(Stage::Forecast, e)),
            Ok(Ok(None)) => Err(ReportError::ForecastUnavailable {
                key: key.to_string(),
            }),
            Ok(Ok(Some(artifact))) => Ok(artifact),
        }
    }

    /// Forecast totals per sub-range label
    pub async fn forecast(
        &self,
        params: &ForecastParams,
        ranges: &[SubRange],
    ) -> ReportResult<ForecastOutcome> {
        let location = self.resolve_location(params.location)?.clone();
        if ranges.is_empty() {
            return Ok(ForecastOutcome {
                location,
                totals: HashMap::new(),
            });
        }

        let weighted: Vec<(&SubRange, Vec<(NaiveDate, f64)>)> =
            ranges.iter().map(|r| (r, day_weights(r))).collect();
        let dates: Vec<NaiveDate> = weighted
            .iter()
            .flat_map(|(_, days)| days.iter().map(|(d, _)| *d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let artifact = self.load_artifact(&location).await?;
        debug!(
            location = %location.name,
            model = ?artifact.model.model_type(),
            dates = dates.len(),
            "running forecast model"
        );

        let model_input = artifact.clone();
        let predictions = tokio::task::spawn_blocking(move || model_input.model.predict(&dates))
            .await
            .map_err(|e| ReportError::ForecastFailed { source: e.into() })?
            .map_err(|source| ReportError::ForecastFailed { source })?;

        let mut totals: HashMap<String, EnergyTotals> = HashMap::new();
        for (range, days) in weighted {
            let mut contribution = EnergyTotals::default();
            for (date, weight) in days {
                let irradiance = predictions.get(&date).copied().ok_or_else(|| {
                    ReportError::ForecastFailed {
                        source: anyhow::anyhow!("model returned no value for {date}"),
                    }
                })?;
                contribution.generated += irradiance.max(0.0) * params.solar_coefficient * weight;
                contribution.consumed += params.consumption.daily(date) * weight;
            }
            *totals.entry(range.label.clone()).or_default() += contribution;
        }

        info!(
            location = %location.name,
            labels = totals.len(),
            "forecast resolved"
        );

        Ok(ForecastOutcome { location, totals })
    }
}

/// Calendar days touched by `range`, each weighted by the fraction of the day
/// the range covers (1.0 for a whole day).
pub fn day_weights(range: &SubRange) -> Vec<(NaiveDate, f64)> {
    let mut out = Vec::new();
    if range.start > range.end {
        return out;
    }

    let mut date = range.start.date();
    let last = range.end.date();
    loop {
        let day_start = date.and_time(NaiveTime::MIN).max(range.start);
        let day_end = end_of_day(date).min(range.end);
        let covered = (day_end - day_start + TICK)
            .num_microseconds()
            .unwrap_or(0) as f64;
        out.push((date, covered / MICROS_PER_DAY));

        if date >= last {
            break;
        }
        match date.checked_add_days(Days::new(1)) {
            Some(next) => date = next,
            None => break,
        }
    }
    out
}
