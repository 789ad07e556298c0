//! Forecast side of hybrid reports: reference catalog, trained artifacts and
//! the resolver that turns them into energy totals for future periods.

pub mod artifacts;
pub mod catalog;
pub mod params;
pub mod resolver;

pub use artifacts::{
    ArtifactStore, CachedArtifactStore, FileArtifactStore, ForecastArtifact, InMemoryArtifactStore,
};
pub use catalog::ReferenceCatalog;
pub use params::{ConsumptionBaseline, ForecastParams, DEFAULT_MONTHLY_CONSUMPTION};
pub use resolver::{day_weights, ForecastOutcome, ForecastResolver};
