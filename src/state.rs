use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::forecast::{CachedArtifactStore, FileArtifactStore, ForecastResolver, ReferenceCatalog};
use crate::repo::{self, ReadingStore};
use crate::report::{ReportEngine, SystemClock};

/// Shared handler state, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub store: Arc<dyn ReadingStore>,
    pub engine: Arc<ReportEngine>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let store = repo::connect(&cfg).await?;

        let mut catalog = ReferenceCatalog::builtin();
        if let Some(extra) = cfg.forecast.extra_location.clone() {
            info!(name = %extra.name, key = %extra.key(), "adding extra reference location");
            catalog = catalog.with_extra(extra);
        }

        let artifacts = CachedArtifactStore::new(FileArtifactStore::new(
            cfg.forecast.artifact_dir.clone(),
        ));
        info!(
            dir = %cfg.forecast.artifact_dir.display(),
            locations = catalog.len(),
            "forecast artifacts configured"
        );

        let resolver = ForecastResolver::new(catalog, Arc::new(artifacts), cfg.forecast.load_timeout());
        let engine = ReportEngine::new(store.clone(), resolver, Arc::new(SystemClock))
            .with_max_periods(cfg.server.max_report_periods);

        Ok(Self::from_parts(cfg, store, engine))
    }

    pub fn from_parts(cfg: Config, store: Arc<dyn ReadingStore>, engine: ReportEngine) -> Self {
        Self {
            cfg,
            store,
            engine: Arc::new(engine),
        }
    }
}
