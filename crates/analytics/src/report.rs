use crate::correlation::{CorrelationAnalysis, CorrelationMatrix, ExtremalPair};
use crate::error::AnalyticsError;
use crate::performance::PerformanceRecord;
use crate::table::{AlignedPriceTable, SymbolFailure};
use configuration::RoundingMode;
use core_types::{ReturnHorizon, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Everything the dashboard renders for one request.
///
/// This struct is the final output of the `AnalyticsEngine` and the payload
/// served to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// Symbols that made it into the analysis, in requested order.
    pub symbols: Vec<Symbol>,
    pub correlation: CorrelationPanel,
    pub performance: PerformanceTable,
    /// Input for the price line chart.
    pub prices: AlignedPriceTable,
    /// Symbols left out because their history could not be loaded.
    pub failures: Vec<SymbolFailure>,
}

/// The heatmap and its summary, or the reason neither can be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationPanel {
    Ready {
        matrix: CorrelationMatrix,
        summary: String,
        highest: ExtremalPair,
        lowest: ExtremalPair,
    },
    Unavailable {
        reason: String,
    },
}

impl CorrelationPanel {
    pub fn summary(&self) -> Option<&str> {
        match self {
            CorrelationPanel::Ready { summary, .. } => Some(summary),
            CorrelationPanel::Unavailable { .. } => None,
        }
    }

    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            CorrelationPanel::Ready { matrix, .. } => Some(matrix),
            CorrelationPanel::Unavailable { .. } => None,
        }
    }
}

/// One row of the performance table; `values` follow `ReturnHorizon::ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceRow {
    pub asset: Symbol,
    pub values: Vec<Option<Decimal>>,
}

impl PerformanceRow {
    pub fn value(&self, horizon: ReturnHorizon) -> Option<Decimal> {
        let index = ReturnHorizon::ALL.iter().position(|h| *h == horizon)?;
        self.values.get(index).copied().flatten()
    }
}

/// A column the performance table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Asset,
    Horizon(ReturnHorizon),
}

impl SortColumn {
    /// Accepts "Asset" or any horizon label/code, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("asset") {
            return Some(SortColumn::Asset);
        }
        ReturnHorizon::from_label(name).map(SortColumn::Horizon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Asset column plus one column per horizon, one row per symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceTable {
    pub columns: Vec<String>,
    pub rows: Vec<PerformanceRow>,
}

impl PerformanceTable {
    pub const ASSET_COLUMN: &'static str = "Asset";

    pub fn from_records(records: &[PerformanceRecord]) -> Self {
        let columns = std::iter::once(Self::ASSET_COLUMN.to_string())
            .chain(ReturnHorizon::ALL.iter().map(|h| h.label().to_string()))
            .collect();

        let rows = records
            .iter()
            .map(|record| PerformanceRow {
                asset: record.symbol.clone(),
                values: ReturnHorizon::ALL.iter().map(|h| record.get(*h)).collect(),
            })
            .collect();

        Self { columns, rows }
    }

    /// Re-orders rows by `column`. Missing values always sort last and equal
    /// values keep their current relative order.
    pub fn sort_by(&mut self, column: SortColumn, order: SortOrder) {
        let directed = |ordering: Ordering| match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        };

        match column {
            SortColumn::Asset => self.rows.sort_by(|a, b| directed(a.asset.cmp(&b.asset))),
            SortColumn::Horizon(horizon) => {
                self.rows
                    .sort_by(|a, b| match (a.value(horizon), b.value(horizon)) {
                        (Some(x), Some(y)) => directed(x.cmp(&y)),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    })
            }
        }
    }
}

/// Merges engine outputs into a `DashboardReport`. Performs no I/O.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    rounding: RoundingMode,
}

impl ReportAssembler {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    pub fn assemble(
        &self,
        table: AlignedPriceTable,
        correlation: Result<CorrelationAnalysis, AnalyticsError>,
        records: &[PerformanceRecord],
        failures: Vec<SymbolFailure>,
    ) -> DashboardReport {
        let correlation = match correlation {
            Ok(analysis) => CorrelationPanel::Ready {
                summary: analysis.statement(self.rounding),
                matrix: analysis.matrix,
                highest: analysis.highest,
                lowest: analysis.lowest,
            },
            Err(error) => CorrelationPanel::Unavailable {
                reason: error.to_string(),
            },
        };

        DashboardReport {
            symbols: table.symbols().to_vec(),
            correlation,
            performance: PerformanceTable::from_records(records),
            prices: table,
            failures,
        }
    }
}
