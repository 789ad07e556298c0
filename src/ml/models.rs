//! Concrete forecast model implementations.

use super::{ForecastModel, ModelType};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

const DAYS_PER_YEAR: f64 = 365.25;

/// One harmonic of the yearly seasonality
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FourierTerm {
    pub sin: f64,
    pub cos: f64,
}

/// Linear trend plus yearly Fourier seasonality:
///
/// `y(t) = intercept + slope * t + Σk (sin_k · sin(2πkt/365.25) + cos_k · cos(2πkt/365.25))`
///
/// with `t` in days since `origin`. Harmonic `k` is `yearly[k - 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalIrradianceModel {
    pub origin: NaiveDate,
    pub intercept: f64,
    pub slope_per_day: f64,
    pub yearly: Vec<FourierTerm>,
}

impl SeasonalIrradianceModel {
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        let phase = 2.0 * PI * t / DAYS_PER_YEAR;
        let seasonal: f64 = self
            .yearly
            .iter()
            .enumerate()
            .map(|(i, term)| {
                let k = (i + 1) as f64;
                term.sin * (k * phase).sin() + term.cos * (k * phase).cos()
            })
            .sum();
        self.intercept + self.slope_per_day * t + seasonal
    }
}

impl ForecastModel for SeasonalIrradianceModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<BTreeMap<NaiveDate, f64>> {
        Ok(dates.iter().map(|&d| (d, self.value_at(d))).collect())
    }

    fn model_type(&self) -> ModelType {
        ModelType::Seasonal
    }
}

/// Long-term mean per calendar month (January first)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyClimatologyModel {
    pub monthly_means: [f64; 12],
}

impl ForecastModel for MonthlyClimatologyModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<BTreeMap<NaiveDate, f64>> {
        Ok(dates
            .iter()
            .map(|&d| (d, self.monthly_means[d.month0() as usize]))
            .collect())
    }

    fn model_type(&self) -> ModelType {
        ModelType::Climatology
    }
}

/// Serialized form of any supported model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ModelArtifact {
    Seasonal(SeasonalIrradianceModel),
    Climatology(MonthlyClimatologyModel),
}

impl ForecastModel for ModelArtifact {
    fn predict(&self, dates: &[NaiveDate]) -> Result<BTreeMap<NaiveDate, f64>> {
        match self {
            Self::Seasonal(m) => m.predict(dates),
            Self::Climatology(m) => m.predict(dates),
        }
    }

    fn model_type(&self) -> ModelType {
        match self {
            Self::Seasonal(m) => m.model_type(),
            Self::Climatology(m) => m.model_type(),
        }
    }
}
