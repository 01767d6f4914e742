//! Calendar-period resampling of daily closes.

use chrono::{Datelike, NaiveDate};
use configuration::FillPolicy;
use rust_decimal::Decimal;

/// The calendar unit a daily series is resampled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Month,
    Year,
}

/// Identifies one calendar period. Years use month `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn key(self, date: NaiveDate) -> PeriodKey {
        match self {
            Period::Month => PeriodKey {
                year: date.year(),
                month: date.month(),
            },
            Period::Year => PeriodKey {
                year: date.year(),
                month: 0,
            },
        }
    }

    fn next(self, key: PeriodKey) -> PeriodKey {
        match self {
            Period::Month if key.month == 12 => PeriodKey {
                year: key.year + 1,
                month: 1,
            },
            Period::Month => PeriodKey {
                year: key.year,
                month: key.month + 1,
            },
            Period::Year => PeriodKey {
                year: key.year + 1,
                month: 0,
            },
        }
    }

    /// Every period from the one containing `first` through the one containing `last`.
    pub fn grid(self, first: NaiveDate, last: NaiveDate) -> Vec<PeriodKey> {
        let end = self.key(last);
        let mut key = self.key(first);
        let mut grid = Vec::new();
        while key <= end {
            grid.push(key);
            key = self.next(key);
        }
        grid
    }
}

/// Samples ascending `(date, close)` observations at each period of `grid`.
///
/// With `ForwardFill` a period takes the last observation dated on or before its
/// end, even if that observation lies in an earlier period. With `WithinPeriod`
/// only observations inside the period count. Periods before the first
/// observation are always `None`.
pub fn resample(
    observations: &[(NaiveDate, Decimal)],
    grid: &[PeriodKey],
    period: Period,
    fill: FillPolicy,
) -> Vec<Option<Decimal>> {
    let mut sampled = Vec::with_capacity(grid.len());
    let mut next = 0;
    let mut latest: Option<(PeriodKey, Decimal)> = None;

    for key in grid {
        while let Some((date, close)) = observations.get(next) {
            let observed = period.key(*date);
            if observed > *key {
                break;
            }
            latest = Some((observed, *close));
            next += 1;
        }

        let value = match (latest, fill) {
            (Some((_, close)), FillPolicy::ForwardFill) => Some(close),
            (Some((observed, close)), FillPolicy::WithinPeriod) if observed == *key => Some(close),
            _ => None,
        };
        sampled.push(value);
    }

    sampled
}

/// Percentage change from `previous` to `current`; `None` when `previous` is zero
/// or the arithmetic overflows.
pub fn pct_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    current
        .checked_sub(previous)?
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Period-over-period percentage changes; one shorter than `values`.
pub fn period_returns(values: &[Option<Decimal>]) -> Vec<Option<Decimal>> {
    values
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(previous), Some(current)) => pct_change(previous, current),
            _ => None,
        })
        .collect()
}
