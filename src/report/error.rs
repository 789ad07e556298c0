use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a collaborator failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Historical,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Historical => write!(f, "historical"),
            Self::Forecast => write!(f, "forecast"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid granularity '{0}', expected one of: day, month, year")]
    InvalidGranularity(String),

    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("report would have {count} periods, the limit is {max}")]
    TooManyPeriods { count: u64, max: u64 },

    #[error("invalid forecast parameters: {0}")]
    InvalidForecastParams(String),

    #[error("no reference location available for forecasting")]
    LocationUnresolved,

    #[error("no forecast artifact for location '{key}'")]
    ForecastUnavailable { key: String },

    #[error("loading forecast artifact '{key}' timed out after {secs}s")]
    ArtifactLoadTimeout { key: String, secs: u64 },

    #[error("forecast prediction failed: {source}")]
    ForecastFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("{stage} store unavailable: {source}")]
    StoreUnavailable {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl ReportError {
    pub fn store(stage: Stage, source: anyhow::Error) -> Self {
        Self::StoreUnavailable { stage, source }
    }

    /// Errors that only invalidate the forecast part of a report
    pub fn is_partial_capable(&self) -> bool {
        matches!(self, Self::ForecastUnavailable { .. })
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StoreUnavailable { stage, .. } => Some(*stage),
            Self::ForecastUnavailable { .. }
            | Self::ArtifactLoadTimeout { .. }
            | Self::ForecastFailed { .. }
            | Self::LocationUnresolved => Some(Stage::Forecast),
            _ => None,
        }
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
