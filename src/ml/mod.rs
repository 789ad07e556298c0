//! Forecast models
//!
//! Models are trained offline (outside this service) and shipped as
//! serialized artifacts. At request time they only answer "what is the
//! expected daily irradiance on these dates".

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod models;

pub use models::{ModelArtifact, MonthlyClimatologyModel, SeasonalIrradianceModel};

/// Model family of an artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelType {
    Seasonal,
    Climatology,
}

/// Metadata recorded by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    pub trained_at: NaiveDateTime,
    pub training_samples: usize,
}

/// Point forecast by date
pub trait ForecastModel: Send + Sync {
    fn predict(&self, dates: &[NaiveDate]) -> Result<BTreeMap<NaiveDate, f64>>;

    fn model_type(&self) -> ModelType;
}
