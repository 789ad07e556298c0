//! Energy balance reports.
//!
//! A report covers an inclusive date range, optionally bucketed by day,
//! month or year. Each bucket is split at "now": the past side is summed from
//! stored readings, the future side comes from the forecast resolver, and the
//! two are merged into consumption/generation/surplus/deficit cells.

pub mod clock;
pub mod cutoff;
pub mod error;
pub mod historical;
pub mod merge;
pub mod periods;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cutoff::{split_at_cutoff, split_period, PeriodSplit};
pub use error::{ReportError, ReportResult, Stage};
pub use historical::aggregate_historical;
pub use merge::merge_contributions;
pub use periods::{generate_periods, whole_range, Granularity};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{end_of_day, ReadingKind, Report, ReportCell, SubRange};
use crate::forecast::{ForecastParams, ForecastResolver};
use crate::repo::ReadingStore;

/// What to report on
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `None` reports the whole range as a single cell
    pub granularity: Option<Granularity>,
    /// Present for hybrid reports; without it future periods read as zero
    pub forecast: Option<ForecastParams>,
    /// Return historical-only cells when no forecast artifact exists
    pub allow_partial: bool,
}

impl ReportRequest {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            granularity: None,
            forecast: None,
            allow_partial: false,
        }
    }

    /// From the first instant of `start` through the last instant of `end`
    pub fn for_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(start.and_time(NaiveTime::MIN), end_of_day(end))
    }

    pub fn grouped_by(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn with_forecast(mut self, params: ForecastParams) -> Self {
        self.forecast = Some(params);
        self
    }

    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    fn validate(&self, max_periods: u64) -> ReportResult<()> {
        if self.start > self.end {
            return Err(ReportError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if let Some(granularity) = self.granularity {
            let count = granularity.bucket_count(self.start.date(), self.end.date());
            if count > max_periods {
                return Err(ReportError::TooManyPeriods {
                    count,
                    max: max_periods,
                });
            }
        }
        if let Some(params) = &self.forecast {
            params.check()?;
        }
        Ok(())
    }
}

/// Period limit used unless the engine is configured otherwise
pub const DEFAULT_MAX_PERIODS: u64 = 10_000;

/// Builds reports from a reading store and a forecast resolver. Holds no
/// per-request state.
pub struct ReportEngine {
    store: Arc<dyn ReadingStore>,
    forecaster: ForecastResolver,
    clock: Arc<dyn Clock>,
    max_periods: u64,
}

impl ReportEngine {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        forecaster: ForecastResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            forecaster,
            clock,
            max_periods: DEFAULT_MAX_PERIODS,
        }
    }

    /// Rejects grouped requests that would produce more than `max` periods
    pub fn with_max_periods(mut self, max: u64) -> Self {
        self.max_periods = max;
        self
    }

    pub fn forecaster(&self) -> &ForecastResolver {
        &self.forecaster
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub async fn build_report(&self, request: &ReportRequest) -> ReportResult<Report> {
        self.build_report_at(request, self.clock.now()).await
    }

    pub async fn build_report_at(
        &self,
        request: &ReportRequest,
        now: NaiveDateTime,
    ) -> ReportResult<Report> {
        request.validate(self.max_periods)?;

        let periods = match request.granularity {
            Some(granularity) => generate_periods(request.start, request.end, granularity),
            None => vec![whole_range(request.start, request.end)],
        };
        let splits = split_at_cutoff(periods, now);

        let historical: Vec<SubRange> = splits.iter().filter_map(|s| s.historical.clone()).collect();
        let future: Vec<SubRange> = splits.iter().filter_map(|s| s.future.clone()).collect();
        debug!(
            periods = splits.len(),
            historical = historical.len(),
            future = future.len(),
            %now,
            "report split at cutoff"
        );

        let forecast = async {
            match &request.forecast {
                Some(params) if !future.is_empty() => {
                    self.forecaster.forecast(params, &future).await.map(Some)
                }
                _ => Ok(None),
            }
        };
        let (historical, forecast) = tokio::join!(
            aggregate_historical(self.store.as_ref(), &historical),
            forecast
        );
        let historical = historical?;

        let mut warnings = Vec::new();
        let (forecast_totals, forecast_location) = match forecast {
            Ok(Some(outcome)) => (outcome.totals, Some(outcome.location)),
            Ok(None) => (HashMap::new(), None),
            Err(e) if request.allow_partial && e.is_partial_capable() => {
                warn!(error = %e, "forecast missing, returning historical-only report");
                warnings.push(e.to_string());
                (HashMap::new(), None)
            }
            Err(e) => return Err(e),
        };

        let cells = merge_contributions(&splits, &historical, &forecast_totals);
        info!(
            start = %request.start,
            end = %request.end,
            granularity = ?request.granularity,
            cells = cells.len(),
            hybrid = forecast_location.is_some(),
            partial = !warnings.is_empty(),
            "report built"
        );

        Ok(Report {
            periods: cells,
            forecast_location,
            warnings,
        })
    }

    /// All-time totals over every stored reading
    pub async fn totals(&self) -> ReportResult<ReportCell> {
        let (consumed, generated) = tokio::try_join!(
            self.store.total_by_type(ReadingKind::Consumed),
            self.store.total_by_type(ReadingKind::Generated),
        )
        .map_err(|e| ReportError::store(Stage::Historical, e))?;
        Ok(ReportCell::new(consumed, generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, LocationKey, ReferenceLocation};
    use crate::forecast::{
        ArtifactStore, ConsumptionBaseline, ForecastArtifact, InMemoryArtifactStore,
        ReferenceCatalog,
    };
    use async_trait::async_trait;
    use crate::repo::{InMemoryReadingStore, MockReadingStore};
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine_with(store: Arc<dyn ReadingStore>) -> ReportEngine {
        engine_with_artifacts(store, Arc::new(InMemoryArtifactStore::new()))
    }

    fn engine_with_artifacts(
        store: Arc<dyn ReadingStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> ReportEngine {
        let resolver = ForecastResolver::new(
            ReferenceCatalog::new(vec![ReferenceLocation::new(18.0, 59.0, "Home")]),
            artifacts,
            Duration::from_secs(1),
        );
        let now = date(2025, 6, 1).and_hms_opt(0, 0, 0).unwrap();
        ReportEngine::new(store, resolver, Arc::new(FixedClock(now)))
    }

    struct UnreachableArtifacts;

    #[async_trait]
    impl ArtifactStore for UnreachableArtifacts {
        async fn load(&self, _key: &LocationKey) -> anyhow::Result<Option<Arc<ForecastArtifact>>> {
            Err(anyhow::anyhow!("permission denied"))
        }
    }

    fn params() -> ForecastParams {
        ForecastParams::new(1.0, ConsumptionBaseline::default(), GeoPoint::new(18.0, 59.0))
    }

    #[test]
    fn test_for_dates_is_inclusive() {
        let request = ReportRequest::for_dates(date(2025, 1, 1), date(2025, 1, 3));
        assert_eq!(request.start, date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            request.end,
            date(2025, 1, 3).and_hms_micro_opt(23, 59, 59, 999_999).unwrap()
        );
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let engine = engine_with(Arc::new(MockReadingStore::new()));
        let request = ReportRequest::for_dates(date(2025, 1, 3), date(2025, 1, 1));
        let err = engine.build_report(&request).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidDateRange { .. }));
    }

    #[tokio::test]
    async fn test_period_limit() {
        let engine = engine_with(Arc::new(InMemoryReadingStore::new())).with_max_periods(31);

        let daily = ReportRequest::for_dates(date(2025, 1, 1), date(2025, 2, 1))
            .grouped_by(Granularity::Day);
        let err = engine.build_report(&daily).await.unwrap_err();
        assert!(matches!(err, ReportError::TooManyPeriods { count: 32, max: 31 }));

        let monthly = daily.grouped_by(Granularity::Month);
        assert_eq!(engine.build_report(&monthly).await.unwrap().periods.len(), 2);

        // a single aggregate is never limited
        let everything = ReportRequest::for_dates(date(1, 1, 1), date(9999, 12, 31));
        assert_eq!(engine.build_report(&everything).await.unwrap().periods.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_forecast_params_rejected_before_queries() {
        let engine = engine_with(Arc::new(MockReadingStore::new()));
        let mut bad = params();
        bad.solar_coefficient = -2.0;
        let request =
            ReportRequest::for_dates(date(2025, 5, 1), date(2025, 7, 1)).with_forecast(bad);
        let err = engine.build_report(&request).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidForecastParams(_)));
    }

    #[tokio::test]
    async fn test_historical_failure_is_tagged() {
        let mut store = MockReadingStore::new();
        store
            .expect_sum_ranges()
            .returning(|_, _| Err(anyhow::anyhow!("pool timed out")));
        let engine = engine_with(Arc::new(store));

        let request = ReportRequest::for_dates(date(2025, 1, 1), date(2025, 1, 31))
            .grouped_by(Granularity::Day);
        let err = engine.build_report(&request).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Historical));
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_without_partial() {
        let engine = engine_with(Arc::new(InMemoryReadingStore::new()));
        let request = ReportRequest::for_dates(date(2025, 5, 30), date(2025, 6, 2))
            .grouped_by(Granularity::Day)
            .with_forecast(params());
        let err = engine.build_report(&request).await.unwrap_err();
        assert!(matches!(err, ReportError::ForecastUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_artifact_partial_report() {
        let engine = engine_with(Arc::new(InMemoryReadingStore::new()));
        let request = ReportRequest::for_dates(date(2025, 5, 30), date(2025, 6, 2))
            .grouped_by(Granularity::Day)
            .with_forecast(params())
            .allow_partial(true);
        let report = engine.build_report(&request).await.unwrap();

        assert!(report.is_partial());
        assert!(report.warnings[0].contains("18.0-59.0-Home"));
        assert!(report.forecast_location.is_none());
        assert_eq!(report.periods.len(), 4);
    }

    #[tokio::test]
    async fn test_artifact_store_failure_is_never_partial() {
        let engine = engine_with_artifacts(
            Arc::new(InMemoryReadingStore::new()),
            Arc::new(UnreachableArtifacts),
        );
        let request = ReportRequest::for_dates(date(2025, 5, 30), date(2025, 6, 2))
            .grouped_by(Granularity::Day)
            .with_forecast(params())
            .allow_partial(true);
        let err = engine.build_report(&request).await.unwrap_err();
        assert!(matches!(err, ReportError::StoreUnavailable { .. }));
        assert_eq!(err.stage(), Some(Stage::Forecast));
    }

    #[tokio::test]
    async fn test_past_only_request_never_forecasts() {
        // no artifact exists, but nothing lies after "now"
        let engine = engine_with(Arc::new(InMemoryReadingStore::new()));
        let request = ReportRequest::for_dates(date(2025, 1, 1), date(2025, 1, 2))
            .grouped_by(Granularity::Day)
            .with_forecast(params());
        let report = engine.build_report(&request).await.unwrap();
        assert!(!report.is_partial());
        assert!(report.forecast_location.is_none());
    }

    #[tokio::test]
    async fn test_totals() {
        let mut store = MockReadingStore::new();
        store
            .expect_total_by_type()
            .returning(|kind| Ok(if kind == ReadingKind::Consumed { 30.0 } else { 45.0 }));
        let engine = engine_with(Arc::new(store));

        let cell = engine.totals().await.unwrap();
        assert_eq!(cell, ReportCell::new(30.0, 45.0));
        assert_eq!(cell.surplus(), 15.0);
    }
}
