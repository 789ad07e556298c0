#![cfg(feature = "db")]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::{debug, info};

use super::ReadingStore;
use crate::domain::{NewReading, Reading, ReadingKind, TimeRange};

/// `energy` table row
#[derive(Debug, Clone, FromRow)]
struct ReadingRow {
    id: i64,
    kind: i16,
    quantity: f64,
    recorded_at: NaiveDateTime,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = anyhow::Error;

    fn try_from(row: ReadingRow) -> Result<Self> {
        let kind = ReadingKind::from_code(row.kind)
            .with_context(|| format!("unknown reading kind {} for id {}", row.kind, row.id))?;
        Ok(Reading {
            id: row.id,
            kind,
            quantity: row.quantity,
            timestamp: row.recorded_at,
        })
    }
}

pub struct PgReadingStore {
    pub pool: PgPool,
}

impl PgReadingStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Create the readings table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS energy (
                id BIGSERIAL PRIMARY KEY,
                kind SMALLINT NOT NULL CHECK (kind IN (1, 2)),
                quantity DOUBLE PRECISION NOT NULL CHECK (quantity >= 0),
                recorded_at TIMESTAMP NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create energy table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS energy_kind_recorded_at ON energy (kind, recorded_at)")
            .execute(&self.pool)
            .await
            .context("Failed to create energy index")?;

        info!("energy schema ready");
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, reading: NewReading) -> Result<Reading> {
        let row = sqlx::query_as::<_, ReadingRow>(
            r#"
            INSERT INTO energy (kind, quantity, recorded_at)
            VALUES ($1, $2, COALESCE($3, now()::timestamp))
            RETURNING id, kind, quantity, recorded_at
            "#,
        )
        .bind(reading.kind.code())
        .bind(reading.quantity)
        .bind(reading.timestamp)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert reading")?;

        debug!(id = row.id, kind = %reading.kind, quantity = row.quantity, "inserted reading");
        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<Reading>> {
        let row = sqlx::query_as::<_, ReadingRow>(
            "SELECT id, kind, quantity, recorded_at FROM energy WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch reading")?;

        row.map(Reading::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Reading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            "SELECT id, kind, quantity, recorded_at FROM energy ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list readings")?;

        rows.into_iter().map(Reading::try_from).collect()
    }

    async fn sum_by_type(&self, kind: ReadingKind, range: TimeRange) -> Result<f64> {
        let total = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::float8
            FROM energy
            WHERE kind = $1 AND recorded_at BETWEEN $2 AND $3
            "#,
        )
        .bind(kind.code())
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to sum {kind} readings"))?;

        Ok(total)
    }

    /// Single round trip: the ranges are unnested and left-joined so that
    /// empty ranges still produce a zero row.
    async fn sum_ranges(&self, kind: ReadingKind, ranges: &[TimeRange]) -> Result<Vec<f64>> {
        if ranges.is_empty() {
            return Ok(Vec::new());
        }

        let starts: Vec<NaiveDateTime> = ranges.iter().map(|r| r.start).collect();
        let ends: Vec<NaiveDateTime> = ranges.iter().map(|r| r.end).collect();

        let totals = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(e.quantity), 0)::float8
            FROM unnest($2::timestamp[], $3::timestamp[]) WITH ORDINALITY AS r(range_start, range_end, idx)
            LEFT JOIN energy e
                ON e.kind = $1 AND e.recorded_at BETWEEN r.range_start AND r.range_end
            GROUP BY r.idx
            ORDER BY r.idx
            "#,
        )
        .bind(kind.code())
        .bind(starts)
        .bind(ends)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to sum {kind} readings over {} ranges", ranges.len()))?;

        Ok(totals)
    }

    async fn total_by_type(&self, kind: ReadingKind) -> Result<f64> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(quantity), 0)::float8 FROM energy WHERE kind = $1",
        )
        .bind(kind.code())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to total {kind} readings"))?;

        Ok(total)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
