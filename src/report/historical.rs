use std::collections::HashMap;
use tracing::debug;

use super::{ReportError, ReportResult, Stage};
use crate::domain::{EnergyTotals, ReadingKind, SubRange, TimeRange};
use crate::repo::ReadingStore;

/// Sum stored readings per sub-range label.
///
/// Consumed and generated sums are fetched concurrently, each as one batch
/// over all ranges. Labels without readings map to zero totals.
pub async fn aggregate_historical(
    store: &dyn ReadingStore,
    ranges: &[SubRange],
) -> ReportResult<HashMap<String, EnergyTotals>> {
    let mut totals = HashMap::with_capacity(ranges.len());
    if ranges.is_empty() {
        return Ok(totals);
    }

    let windows: Vec<TimeRange> = ranges.iter().map(SubRange::range).collect();
    let (consumed, generated) = tokio::try_join!(
        store.sum_ranges(ReadingKind::Consumed, &windows),
        store.sum_ranges(ReadingKind::Generated, &windows),
    )
    .map_err(|e| ReportError::store(Stage::Historical, e))?;

    if consumed.len() != ranges.len() || generated.len() != ranges.len() {
        return Err(ReportError::store(
            Stage::Historical,
            anyhow::anyhow!(
                "store returned {}/{} sums for {} ranges",
                consumed.len(),
                generated.len(),
                ranges.len()
            ),
        ));
    }

    for ((range, consumed), generated) in ranges.iter().zip(consumed).zip(generated) {
        *totals
            .entry(range.label.clone())
            .or_insert_with(EnergyTotals::default) += EnergyTotals::new(consumed, generated);
    }

    debug!(ranges = ranges.len(), "historical totals aggregated");
    Ok(totals)
}
