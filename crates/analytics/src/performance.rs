use crate::resample::{pct_change, period_returns, resample, Period, PeriodKey};
use crate::table::AlignedPriceTable;
use configuration::{AnalysisSettings, FillPolicy, RoundingMode};
use core_types::{ReturnHorizon, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Percentage returns of one symbol over every horizon.
///
/// A `None` value means the symbol lacks the history the horizon needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceRecord {
    pub symbol: Symbol,
    pub returns: BTreeMap<ReturnHorizon, Option<Decimal>>,
}

impl PerformanceRecord {
    pub fn get(&self, horizon: ReturnHorizon) -> Option<Decimal> {
        self.returns.get(&horizon).copied().flatten()
    }
}

/// Computes multi-horizon returns from an aligned price table.
///
/// Monthly and yearly closes are sampled on a period grid shared by every
/// column, spanning the table's first to last date, so the last period of a
/// symbol holds its current value.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceEngine {
    fill: FillPolicy,
    rounding: RoundingMode,
}

impl PerformanceEngine {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            fill: settings.fill,
            rounding: settings.rounding,
        }
    }

    /// One record per table column, in column order.
    pub fn evaluate(&self, table: &AlignedPriceTable) -> Vec<PerformanceRecord> {
        let (Some(first), Some(last)) = (table.first_date(), table.last_date()) else {
            return table
                .symbols()
                .iter()
                .map(|symbol| PerformanceRecord {
                    symbol: symbol.clone(),
                    returns: ReturnHorizon::ALL.iter().map(|h| (*h, None)).collect(),
                })
                .collect();
        };

        let months = Period::Month.grid(first, last);
        let years = Period::Year.grid(first, last);

        (0..table.width())
            .map(|index| self.record(table, index, &months, &years))
            .collect()
    }

    fn record(
        &self,
        table: &AlignedPriceTable,
        index: usize,
        months: &[PeriodKey],
        years: &[PeriodKey],
    ) -> PerformanceRecord {
        let observations = table.observations(index);
        let monthly = period_returns(&resample(&observations, months, Period::Month, self.fill));
        let yearly = period_returns(&resample(&observations, years, Period::Year, self.fill));
        // The last yearly return runs into the current value and is reported as YTD.
        let completed_years = &yearly[..yearly.len().saturating_sub(1)];

        let returns = ReturnHorizon::ALL
            .iter()
            .map(|horizon| {
                let value = match horizon {
                    ReturnHorizon::OneDay => last_daily_change(&observations),
                    ReturnHorizon::OneMonth => nth_from_end(&monthly, 0),
                    ReturnHorizon::ThreeMonths => sum_of_last(&monthly, 3),
                    ReturnHorizon::YearToDate => nth_from_end(&yearly, 0),
                    ReturnHorizon::OneYear => nth_from_end(&yearly, 1),
                    ReturnHorizon::ThreeYears => mean_of_last(completed_years, 3),
                    ReturnHorizon::FiveYears => mean_of_last(completed_years, 5),
                    ReturnHorizon::TenYears => mean_of_last(completed_years, 10),
                };
                (*horizon, value.map(|v| self.round(v)))
            })
            .collect();

        PerformanceRecord {
            symbol: table.symbols()[index].clone(),
            returns,
        }
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(2, self.rounding.strategy())
    }
}

fn last_daily_change(observations: &[(chrono::NaiveDate, Decimal)]) -> Option<Decimal> {
    match observations {
        [.., (_, previous), (_, current)] => pct_change(*previous, *current),
        _ => None,
    }
}

fn nth_from_end(returns: &[Option<Decimal>], n: usize) -> Option<Decimal> {
    returns.iter().rev().nth(n).copied().flatten()
}

/// Simple (not compounded) sum of the last `n` returns; all `n` must exist.
fn sum_of_last(returns: &[Option<Decimal>], n: usize) -> Option<Decimal> {
    if returns.len() < n {
        return None;
    }
    returns[returns.len() - n..]
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add((*r)?))
}

/// Mean of the valid returns among the last `n`; periods without data are dropped.
fn mean_of_last(returns: &[Option<Decimal>], n: usize) -> Option<Decimal> {
    let valid: Vec<Decimal> = returns[returns.len().saturating_sub(n)..]
        .iter()
        .flatten()
        .copied()
        .collect();
    if valid.is_empty() {
        return None;
    }
    let total = valid
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r))?;
    total.checked_div(Decimal::from(valid.len()))
}
