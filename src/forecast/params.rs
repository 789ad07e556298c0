use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::domain::GeoPoint;
use crate::report::ReportError;

/// Per-date consumption assumed for months missing from a table
pub const DEFAULT_MONTHLY_CONSUMPTION: f64 = 500.0;

/// Expected consumption for each forecast date, looked up by the date's month.
///
/// JSON: `{"monthly": {"1": 620, "7": 410}}` or `{"flat": 450}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionBaseline {
    /// Month number (1-12) → consumption per date in that month
    Monthly(BTreeMap<u32, f64>),
    /// Same consumption for every date
    Flat(f64),
}

impl Default for ConsumptionBaseline {
    fn default() -> Self {
        Self::Monthly(BTreeMap::new())
    }
}

impl ConsumptionBaseline {
    pub fn for_month(&self, month: u32) -> f64 {
        match self {
            Self::Monthly(table) => table
                .get(&month)
                .copied()
                .unwrap_or(DEFAULT_MONTHLY_CONSUMPTION),
            Self::Flat(value) => *value,
        }
    }

    /// Consumption one whole forecast date contributes
    pub fn daily(&self, date: NaiveDate) -> f64 {
        self.for_month(date.month())
    }
}

fn validate_baseline(baseline: &ConsumptionBaseline) -> Result<(), ValidationError> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    let ok = match baseline {
        ConsumptionBaseline::Monthly(table) => table
            .iter()
            .all(|(month, value)| (1..=12).contains(month) && valid(*value)),
        ConsumptionBaseline::Flat(value) => valid(*value),
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("consumption_baseline")
            .with_message("months must be 1-12 and consumption non-negative".into()))
    }
}

/// Inputs that switch a report from historical-only to hybrid mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ForecastParams {
    /// Converts forecast irradiance into generated energy
    #[validate(range(min = 0.0))]
    pub solar_coefficient: f64,
    #[serde(default)]
    #[validate(custom(function = "validate_baseline"))]
    pub consumption: ConsumptionBaseline,
    #[validate(nested)]
    pub location: GeoPoint,
}

impl ForecastParams {
    pub fn new(solar_coefficient: f64, consumption: ConsumptionBaseline, location: GeoPoint) -> Self {
        Self {
            solar_coefficient,
            consumption,
            location,
        }
    }

    pub fn check(&self) -> Result<(), ReportError> {
        if !self.solar_coefficient.is_finite() {
            return Err(ReportError::InvalidForecastParams(
                "solar_coefficient must be finite".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| ReportError::InvalidForecastParams(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_table_with_default() {
        let baseline = ConsumptionBaseline::Monthly(BTreeMap::from([(1, 620.0), (2, 290.0)]));
        assert_eq!(baseline.for_month(1), 620.0);
        assert_eq!(baseline.for_month(6), DEFAULT_MONTHLY_CONSUMPTION);
        assert_eq!(baseline.daily(date(2025, 1, 5)), 620.0);
        assert_eq!(baseline.daily(date(2024, 2, 29)), 290.0);
        assert_eq!(baseline.daily(date(2025, 6, 1)), 500.0);
    }

    #[test]
    fn test_flat_baseline() {
        let baseline = ConsumptionBaseline::Flat(300.0);
        assert_eq!(baseline.daily(date(2025, 4, 1)), 300.0);
        assert_eq!(baseline.daily(date(2025, 12, 31)), 300.0);
    }

    #[test]
    fn test_default_baseline_sums_per_date() {
        let baseline = ConsumptionBaseline::default();
        let january: f64 = (1..=31).map(|d| baseline.daily(date(2025, 1, d))).sum();
        assert_eq!(january, 31.0 * DEFAULT_MONTHLY_CONSUMPTION);
    }

    #[test]
    fn test_baseline_json_forms() {
        let monthly: ConsumptionBaseline =
            serde_json::from_str(r#"{"monthly": {"1": 620, "7": 410.5}}"#).unwrap();
        assert_eq!(monthly.for_month(7), 410.5);

        let flat: ConsumptionBaseline = serde_json::from_str(r#"{"flat": 450}"#).unwrap();
        assert_eq!(flat, ConsumptionBaseline::Flat(450.0));
    }

    #[test]
    fn test_params_validation() {
        let ok = ForecastParams::new(1.2, ConsumptionBaseline::default(), GeoPoint::new(18.0, 59.0));
        assert!(ok.check().is_ok());

        let negative = ForecastParams { solar_coefficient: -1.0, ..ok.clone() };
        assert!(matches!(negative.check(), Err(ReportError::InvalidForecastParams(_))));

        let bad_month = ForecastParams {
            consumption: ConsumptionBaseline::Monthly(BTreeMap::from([(13, 100.0)])),
            ..ok.clone()
        };
        assert!(bad_month.check().is_err());

        let bad_lat = ForecastParams { location: GeoPoint::new(0.0, 95.0), ..ok };
        assert!(bad_lat.check().is_err());
    }
}
