use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{NewReading, Reading, ReadingKind, TimeRange};

pub mod memory;
#[cfg(feature = "db")]
pub mod pg;

pub use memory::InMemoryReadingStore;

/// Persistence for energy readings.
///
/// Sums coalesce to zero: a range without readings is `0.0`, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, reading: NewReading) -> Result<Reading>;

    async fn get(&self, id: i64) -> Result<Option<Reading>>;

    async fn list(&self) -> Result<Vec<Reading>>;

    /// Sum of `kind` readings with timestamp in `[start, end]`
    async fn sum_by_type(&self, kind: ReadingKind, range: TimeRange) -> Result<f64>;

    /// One sum per range, in the order given
    async fn sum_ranges(&self, kind: ReadingKind, ranges: &[TimeRange]) -> Result<Vec<f64>> {
        let mut sums = Vec::with_capacity(ranges.len());
        for range in ranges {
            sums.push(self.sum_by_type(kind, *range).await?);
        }
        Ok(sums)
    }

    /// Sum over every stored reading of `kind`
    async fn total_by_type(&self, kind: ReadingKind) -> Result<f64>;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the configured reading store
pub async fn connect(cfg: &Config) -> Result<Arc<dyn ReadingStore>> {
    #[cfg(feature = "db")]
    {
        let store = pg::PgReadingStore::connect(&cfg.db.url, cfg.db.max_connections).await?;
        store.ensure_schema().await?;
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "db"))]
    {
        let _ = cfg;
        tracing::warn!("built without the `db` feature, readings are kept in memory only");
        return Ok(Arc::new(InMemoryReadingStore::new()));
    }
}
