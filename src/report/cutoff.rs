use chrono::{NaiveDateTime, SubsecRound};

use crate::domain::{Period, SubRange, TICK};

/// A period with its historical and forecast sides relative to "now"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSplit {
    pub period: Period,
    pub historical: Option<SubRange>,
    pub future: Option<SubRange>,
}

/// Truncate to storage resolution so `now + TICK` stays aligned with
/// period boundaries.
pub fn normalize_instant(t: NaiveDateTime) -> NaiveDateTime {
    t.trunc_subsecs(6)
}

pub fn split_period(period: Period, now: NaiveDateTime) -> PeriodSplit {
    let now = normalize_instant(now);
    let sub = |start, end| SubRange {
        label: period.label.clone(),
        start,
        end,
    };

    let (historical, future) = if period.range_end <= now {
        (Some(sub(period.range_start, period.range_end)), None)
    } else if period.range_start > now {
        (None, Some(sub(period.range_start, period.range_end)))
    } else {
        (
            Some(sub(period.range_start, now)),
            Some(sub(now + TICK, period.range_end)),
        )
    };

    PeriodSplit {
        period,
        historical,
        future,
    }
}

pub fn split_at_cutoff(periods: Vec<Period>, now: NaiveDateTime) -> Vec<PeriodSplit> {
    periods
        .into_iter()
        .map(|p| split_period(p, now))
        .collect()
}
