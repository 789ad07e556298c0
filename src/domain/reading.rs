use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use validator::Validate;

/// Direction of an energy reading.
///
/// Persisted as `1` (consumed) / `2` (generated).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Consumed,
    Generated,
}

impl ReadingKind {
    pub const ALL: [ReadingKind; 2] = [ReadingKind::Consumed, ReadingKind::Generated];

    pub fn code(self) -> i16 {
        match self {
            Self::Consumed => 1,
            Self::Generated => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Consumed),
            2 => Some(Self::Generated),
            _ => None,
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumed => write!(f, "consumed"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// A stored energy reading. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: i64,
    pub kind: ReadingKind,
    pub quantity: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
}

/// Ingestion payload for a new reading
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewReading {
    pub kind: ReadingKind,
    #[validate(range(min = 0.0, message = "quantity must be non-negative"))]
    pub quantity: f64,
    /// Defaults to the ingestion time when absent
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl NewReading {
    pub fn new(kind: ReadingKind, quantity: f64) -> Self {
        Self {
            kind,
            quantity,
            timestamp: None,
        }
    }

    pub fn at(kind: ReadingKind, quantity: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            kind,
            quantity,
            timestamp: Some(timestamp),
        }
    }
}

/// `DD.MM.YYYY in HH.MM.SS`, the format existing clients parse.
fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.format("%d.%m.%Y in %H.%M.%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_kind_codes() {
        for kind in ReadingKind::ALL {
            assert_eq!(ReadingKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ReadingKind::from_code(3), None);
    }

    #[test]
    fn test_reading_serialization() {
        let reading = Reading {
            id: 7,
            kind: ReadingKind::Generated,
            quantity: 12.5,
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 9)
                .unwrap()
                .and_hms_opt(14, 5, 0)
                .unwrap(),
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["kind"], "generated");
        assert_eq!(json["timestamp"], "09.03.2025 in 14.05.00");
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let reading = NewReading::new(ReadingKind::Consumed, -1.0);
        assert!(reading.validate().is_err());
        assert!(NewReading::new(ReadingKind::Consumed, 0.0).validate().is_ok());
    }
}
