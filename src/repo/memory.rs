//! In-process reading store, used when the service runs without a database
//! and as the store behind tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use parking_lot::RwLock;

use super::ReadingStore;
use crate::domain::{NewReading, Reading, ReadingKind, TimeRange};

#[derive(Debug, Default)]
pub struct InMemoryReadingStore {
    readings: RwLock<Vec<Reading>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sum_where(&self, kind: ReadingKind, pred: impl Fn(NaiveDateTime) -> bool) -> f64 {
        self.readings
            .read()
            .iter()
            .filter(|r| r.kind == kind && pred(r.timestamp))
            .map(|r| r.quantity)
            .sum()
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert(&self, reading: NewReading) -> Result<Reading> {
        if reading.quantity < 0.0 || !reading.quantity.is_finite() {
            anyhow::bail!("quantity must be a non-negative number, got {}", reading.quantity);
        }

        let mut readings = self.readings.write();
        let stored = Reading {
            id: readings.len() as i64 + 1,
            kind: reading.kind,
            quantity: reading.quantity,
            timestamp: reading
                .timestamp
                .unwrap_or_else(|| Local::now().naive_local()),
        };
        readings.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<Reading>> {
        Ok(self.readings.read().iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Reading>> {
        Ok(self.readings.read().clone())
    }

    async fn sum_by_type(&self, kind: ReadingKind, range: TimeRange) -> Result<f64> {
        Ok(self.sum_where(kind, |ts| ts >= range.start && ts <= range.end))
    }

    async fn total_by_type(&self, kind: ReadingKind) -> Result<f64> {
        Ok(self.sum_where(kind, |_| true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = InMemoryReadingStore::new();
        let a = store.insert(NewReading::at(ReadingKind::Consumed, 1.0, day(1))).await.unwrap();
        let b = store.insert(NewReading::new(ReadingKind::Generated, 2.0)).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.get(2).await.unwrap(), Some(b));
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert!(store.get(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sums_are_inclusive_and_coalesced() {
        let store = InMemoryReadingStore::new();
        store.insert(NewReading::at(ReadingKind::Consumed, 10.0, day(1))).await.unwrap();
        store.insert(NewReading::at(ReadingKind::Consumed, 5.0, day(2))).await.unwrap();
        store.insert(NewReading::at(ReadingKind::Generated, 3.0, day(2))).await.unwrap();

        let range = TimeRange::new(day(1), day(2));
        assert_eq!(store.sum_by_type(ReadingKind::Consumed, range).await.unwrap(), 15.0);
        assert_eq!(store.sum_by_type(ReadingKind::Generated, range).await.unwrap(), 3.0);

        let empty = TimeRange::new(day(5), day(6));
        assert_eq!(store.sum_by_type(ReadingKind::Consumed, empty).await.unwrap(), 0.0);

        let sums = store
            .sum_ranges(ReadingKind::Consumed, &[TimeRange::new(day(2), day(2)), empty])
            .await
            .unwrap();
        assert_eq!(sums, vec![5.0, 0.0]);
        assert_eq!(store.total_by_type(ReadingKind::Consumed).await.unwrap(), 15.0);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let store = InMemoryReadingStore::new();
        assert!(store.insert(NewReading::new(ReadingKind::Consumed, -5.0)).await.is_err());
    }
}
