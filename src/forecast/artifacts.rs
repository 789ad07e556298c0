//! Forecast artifact repositories.
//!
//! The training pipeline writes one bincode-encoded [`ForecastArtifact`] per
//! reference location into a directory, named `{location key}_model.bin`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{LocationKey, ReferenceLocation};
use crate::ml::{ModelArtifact, ModelMetadata};

/// A trained model bound to the reference location it was trained for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastArtifact {
    pub reference: ReferenceLocation,
    pub metadata: ModelMetadata,
    pub model: ModelArtifact,
}

impl ForecastArtifact {
    pub fn key(&self) -> LocationKey {
        self.reference.key()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to encode forecast artifact")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to decode forecast artifact")
    }
}

/// Read-only lookup of artifacts by location key.
///
/// `Ok(None)` means no artifact was trained for the key; `Err` means the
/// store itself could not be read.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn load(&self, key: &LocationKey) -> Result<Option<Arc<ForecastArtifact>>>;
}

/// Directory of `{key}_model.bin` files
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &LocationKey) -> PathBuf {
        self.dir.join(format!("{key}_model.bin"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an artifact where [`FileArtifactStore::load`] will find it
    pub fn save(&self, artifact: &ForecastArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(&artifact.key());
        std::fs::write(&path, artifact.to_bytes()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved forecast artifact");
        Ok(path)
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn load(&self, key: &LocationKey) -> Result<Option<Arc<ForecastArtifact>>> {
        let path = self.path_for(key);

        // file read + decode can be large; keep it off the async workers
        tokio::task::spawn_blocking(move || -> Result<Option<Arc<ForecastArtifact>>> {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no forecast artifact");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()))
                }
            };
            let artifact = ForecastArtifact::from_bytes(&bytes)
                .with_context(|| format!("Corrupt artifact {}", path.display()))?;
            Ok(Some(Arc::new(artifact)))
        })
        .await
        .context("Artifact loader task failed")?
    }
}

/// Fixed set of artifacts held in memory
#[derive(Default)]
pub struct InMemoryArtifactStore {
    artifacts: HashMap<LocationKey, Arc<ForecastArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, artifact: ForecastArtifact) -> Self {
        self.artifacts.insert(artifact.key(), Arc::new(artifact));
        self
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn load(&self, key: &LocationKey) -> Result<Option<Arc<ForecastArtifact>>> {
        Ok(self.artifacts.get(key).cloned())
    }
}

/// Memoizes successful loads of an inner store. Misses are not cached, so an
/// artifact produced later by the training pipeline is picked up.
pub struct CachedArtifactStore<S> {
    inner: S,
    cache: RwLock<HashMap<LocationKey, Arc<ForecastArtifact>>>,
}

impl<S: ArtifactStore> CachedArtifactStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

#[async_trait]
impl<S: ArtifactStore> ArtifactStore for CachedArtifactStore<S> {
    async fn load(&self, key: &LocationKey) -> Result<Option<Arc<ForecastArtifact>>> {
        let hit = self.cache.read().get(key).cloned();
        if hit.is_some() {
            return Ok(hit);
        }

        let loaded = self.inner.load(key).await?;
        if let Some(artifact) = &loaded {
            self.cache.write().insert(key.clone(), artifact.clone());
            debug!(key = %key, "cached forecast artifact");
        }
        Ok(loaded)
    }
}
