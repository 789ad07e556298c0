use std::collections::HashMap;

use super::cutoff::PeriodSplit;
use crate::domain::{EnergyTotals, ReportCell, ReportCells};

/// Combine historical and forecast totals into one cell per period, in
/// period order. A label missing from either side contributes zero.
pub fn merge_contributions(
    splits: &[PeriodSplit],
    historical: &HashMap<String, EnergyTotals>,
    forecast: &HashMap<String, EnergyTotals>,
) -> ReportCells {
    let mut cells = ReportCells::default();
    for split in splits {
        let label = split.period.label.as_str();
        let hist = historical.get(label).copied().unwrap_or_default();
        let fc = forecast.get(label).copied().unwrap_or_default();
        cells.push(label, ReportCell::from(hist + fc));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;
    use chrono::NaiveDate;

    fn split(label: &str) -> PeriodSplit {
        let t = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PeriodSplit {
            period: Period {
                label: label.to_string(),
                range_start: t,
                range_end: t,
            },
            historical: None,
            future: None,
        }
    }

    #[test]
    fn test_merge_keeps_period_order_and_sums() {
        let splits = vec![split("b"), split("a"), split("c")];
        let historical = HashMap::from([
            ("a".to_string(), EnergyTotals::new(10.0, 4.0)),
            ("b".to_string(), EnergyTotals::new(1.0, 1.0)),
        ]);
        let forecast = HashMap::from([("a".to_string(), EnergyTotals::new(5.0, 20.0))]);

        let cells = merge_contributions(&splits, &historical, &forecast);

        assert_eq!(cells.labels().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        let a = cells.get("a").unwrap();
        assert_eq!(a.consumption(), 15.0);
        assert_eq!(a.generation(), 24.0);
        assert_eq!(a.surplus(), 9.0);
        assert_eq!(a.deficit(), 0.0);
        assert_eq!(cells.get("c").unwrap(), &ReportCell::new(0.0, 0.0));
    }
}
