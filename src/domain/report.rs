use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::ops::{Add, AddAssign};

use super::ReferenceLocation;

/// Smallest representable step between two instants (storage resolution).
pub const TICK: Duration = Duration::microseconds(1);

/// Last representable instant of `date`
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    match date.checked_add_days(Days::new(1)) {
        Some(next) => next.and_time(NaiveTime::MIN) - TICK,
        None => NaiveDateTime::MAX,
    }
}

/// Inclusive time range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

/// A labeled calendar bucket clipped to the requested range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub label: String,
    pub range_start: NaiveDateTime,
    pub range_end: NaiveDateTime,
}

impl Period {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.range_start, self.range_end)
    }
}

/// The historical or forecast side of a period relative to "now"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRange {
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SubRange {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// Consumed/generated energy contributed to one label by one source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyTotals {
    pub consumed: f64,
    pub generated: f64,
}

impl EnergyTotals {
    pub fn new(consumed: f64, generated: f64) -> Self {
        Self {
            consumed,
            generated,
        }
    }
}

impl Add for EnergyTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.consumed + rhs.consumed, self.generated + rhs.generated)
    }
}

impl AddAssign for EnergyTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// One row of a report.
///
/// Fields are private so that surplus and deficit can only be derived from
/// consumption and generation: at most one of them is positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportCell {
    consumption: f64,
    generation: f64,
    surplus: f64,
    deficit: f64,
}

impl ReportCell {
    pub fn new(consumption: f64, generation: f64) -> Self {
        let consumption = consumption.max(0.0);
        let generation = generation.max(0.0);
        Self {
            consumption,
            generation,
            surplus: (generation - consumption).max(0.0),
            deficit: (consumption - generation).max(0.0),
        }
    }

    pub fn consumption(&self) -> f64 {
        self.consumption
    }

    pub fn generation(&self) -> f64 {
        self.generation
    }

    pub fn surplus(&self) -> f64 {
        self.surplus
    }

    pub fn deficit(&self) -> f64 {
        self.deficit
    }
}

impl From<EnergyTotals> for ReportCell {
    fn from(totals: EnergyTotals) -> Self {
        Self::new(totals.consumed, totals.generated)
    }
}

/// Label → cell entries in chronological order.
///
/// Serialized as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportCells(Vec<(String, ReportCell)>);

impl ReportCells {
    pub fn push(&mut self, label: impl Into<String>, cell: ReportCell) {
        self.0.push((label.into(), cell));
    }

    pub fn get(&self, label: &str) -> Option<&ReportCell> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, c)| c)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportCell)> {
        self.0.iter().map(|(l, c)| (l.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ReportCells {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, cell) in &self.0 {
            map.serialize_entry(label, cell)?;
        }
        map.end()
    }
}

/// Output of the report engine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub periods: ReportCells,
    /// Reference location whose forecast filled the future periods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_location: Option<ReferenceLocation>,
    /// Set when a partial report was returned
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Report {
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}
