//! The Price Table Builder: turns per-symbol price histories into one
//! date-indexed table with a column per symbol.

use crate::error::AnalyticsError;
use chrono::NaiveDate;
use configuration::{DuplicatePolicy, FetchFailurePolicy};
use core_types::{FetchError, PriceSeries, Symbol};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// A symbol whose price history could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    pub symbol: Symbol,
    pub reason: String,
}

impl From<FetchError> for SymbolFailure {
    fn from(error: FetchError) -> Self {
        Self {
            symbol: error.symbol().clone(),
            reason: error.to_string(),
        }
    }
}

/// Parses the free-text, comma-separated ticker list a user typed.
///
/// Empty tokens (`"spy,,vnq"`, a trailing comma) are ignored. Fails before any
/// fetch when nothing usable is left or a token is malformed.
pub fn parse_symbol_list(
    text: &str,
    duplicates: DuplicatePolicy,
) -> Result<Vec<Symbol>, AnalyticsError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in text.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let symbol =
            Symbol::parse(token).map_err(|e| AnalyticsError::InvalidSymbolInput(e.to_string()))?;

        if !seen.insert(symbol.clone()) {
            match duplicates {
                DuplicatePolicy::Collapse => {
                    tracing::debug!(%symbol, "Dropping duplicate symbol.");
                    continue;
                }
                DuplicatePolicy::Reject => {
                    return Err(AnalyticsError::InvalidSymbolInput(format!(
                        "{} is listed more than once",
                        symbol
                    )));
                }
            }
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(AnalyticsError::InvalidSymbolInput(
            "no ticker symbols were supplied".to_string(),
        ));
    }

    Ok(symbols)
}

/// Closing prices of several symbols on the union of their trading dates.
///
/// `dates` is strictly ascending; `columns[i][k]` is the close of `symbols[i]` on
/// `dates[k]`, or `None` when that symbol has no quote for the date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    columns: Vec<Vec<Option<Decimal>>>,
}

impl AlignedPriceTable {
    /// Aligns already-validated series. Column order follows the input order.
    pub fn from_series(series: &[PriceSeries]) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .iter()
            .map(|s| {
                let mut column = vec![None; dates.len()];
                for point in s.points() {
                    if let Ok(row) = dates.binary_search(&point.date) {
                        column[row] = Some(point.close);
                    }
                }
                column
            })
            .collect();

        Self {
            dates,
            symbols: series.iter().map(|s| s.symbol.clone()).collect(),
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of symbol columns.
    pub fn width(&self) -> usize {
        self.symbols.len()
    }

    /// Number of date rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Every column in symbol order, each with one cell per date.
    pub fn columns(&self) -> &[Vec<Option<Decimal>>] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&[Option<Decimal>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn column_of(&self, symbol: &Symbol) -> Option<&[Option<Decimal>]> {
        let index = self.symbols.iter().position(|s| s == symbol)?;
        self.column(index)
    }

    /// The dates on which the column at `index` actually has a close.
    /// Empty when `index` is out of range.
    pub fn observations(&self, index: usize) -> Vec<(NaiveDate, Decimal)> {
        let Some(column) = self.column(index) else {
            return Vec::new();
        };
        self.dates
            .iter()
            .zip(column)
            .filter_map(|(date, close)| close.map(|c| (*date, c)))
            .collect()
    }
}

/// The aligned table plus the symbols that were left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBuild {
    pub table: AlignedPriceTable,
    pub failures: Vec<SymbolFailure>,
}

/// Aligns fetched price histories, enforcing the fetch-failure policy.
#[derive(Debug, Clone, Copy)]
pub struct PriceTableBuilder {
    on_failure: FetchFailurePolicy,
}

impl PriceTableBuilder {
    pub fn new(on_failure: FetchFailurePolicy) -> Self {
        Self { on_failure }
    }

    /// Builds the table from one fetch outcome per requested symbol, in request order.
    ///
    /// A failed fetch or an empty series is a per-symbol failure. Under
    /// `FetchFailurePolicy::Abort` any failure aborts the build; under `SkipFailed`
    /// the symbol is left out and reported in `TableBuild::failures`. A build in
    /// which no symbol survives always fails.
    pub fn build(
        &self,
        fetched: Vec<(Symbol, Result<PriceSeries, FetchError>)>,
    ) -> Result<TableBuild, AnalyticsError> {
        let mut loaded: Vec<PriceSeries> = Vec::with_capacity(fetched.len());
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for (symbol, outcome) in fetched {
            if !seen.insert(symbol.clone()) {
                tracing::debug!(%symbol, "Ignoring repeated fetch result.");
                continue;
            }
            match outcome {
                Ok(series) if series.is_empty() => {
                    failures.push(SymbolFailure::from(FetchError::Empty(symbol)));
                }
                Ok(mut series) => {
                    // Column labels always come from the requested symbol.
                    series.symbol = symbol;
                    loaded.push(series);
                }
                Err(error) => failures.push(SymbolFailure {
                    symbol,
                    reason: error.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            if self.on_failure == FetchFailurePolicy::Abort || loaded.is_empty() {
                return Err(AnalyticsError::FetchFailures(failures));
            }
            for failure in &failures {
                tracing::warn!(symbol = %failure.symbol, reason = %failure.reason, "Skipping symbol without usable price history.");
            }
        }

        let table = AlignedPriceTable::from_series(&loaded);
        tracing::debug!(
            columns = table.width(),
            rows = table.len(),
            "Aligned price table built."
        );

        Ok(TableBuild { table, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn series(s: &str, points: &[(NaiveDate, Decimal)]) -> PriceSeries {
        PriceSeries::new(sym(s), points.iter().map(|(d, c)| PricePoint::new(*d, *c)))
    }

    #[test]
    fn test_parse_symbol_list_normalizes_and_skips_blanks() {
        let symbols = parse_symbol_list(" spy, gbtc ,, vnq,", DuplicatePolicy::Collapse).unwrap();
        let names: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["SPY", "GBTC", "VNQ"]);
    }

    #[test]
    fn test_parse_symbol_list_collapses_duplicates_to_first_position() {
        let symbols = parse_symbol_list("AAA, bbb, aaa", DuplicatePolicy::Collapse).unwrap();
        assert_eq!(symbols, vec![sym("AAA"), sym("BBB")]);
    }

    #[test]
    fn test_parse_symbol_list_rejects_duplicates_when_configured() {
        let err = parse_symbol_list("AAA, aaa", DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidSymbolInput(_)));
    }

    #[test]
    fn test_parse_symbol_list_rejects_empty_and_malformed_input() {
        assert!(matches!(
            parse_symbol_list(" , ,", DuplicatePolicy::Collapse),
            Err(AnalyticsError::InvalidSymbolInput(_))
        ));
        assert!(matches!(
            parse_symbol_list("spy, b@d", DuplicatePolicy::Collapse),
            Err(AnalyticsError::InvalidSymbolInput(_))
        ));
    }

    #[test]
    fn test_table_uses_union_of_dates_and_leaves_gaps_missing() {
        let a = series("AAA", &[(date(2024, 1, 2), dec!(10)), (date(2024, 1, 4), dec!(11))]);
        let b = series("BBB", &[(date(2024, 1, 3), dec!(20)), (date(2024, 1, 4), dec!(21))]);

        let table = AlignedPriceTable::from_series(&[a, b]);

        assert_eq!(
            table.dates(),
            &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]
        );
        assert_eq!(table.column(0), Some(&[Some(dec!(10)), None, Some(dec!(11))][..]));
        assert_eq!(table.column(1), Some(&[None, Some(dec!(20)), Some(dec!(21))][..]));
        assert_eq!(table.column(2), None);
        assert!(table.observations(2).is_empty());
        assert_eq!(table.observations(1).len(), 2);
    }

    #[test]
    fn test_build_aborts_on_failure_by_default() {
        let builder = PriceTableBuilder::new(FetchFailurePolicy::Abort);
        let fetched = vec![
            (sym("AAA"), Ok(series("AAA", &[(date(2024, 1, 2), dec!(1))]))),
            (sym("ZZZ"), Err(FetchError::NotFound(sym("ZZZ")))),
        ];

        match builder.build(fetched) {
            Err(AnalyticsError::FetchFailures(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].symbol, sym("ZZZ"));
            }
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }

    #[test]
    fn test_build_treats_empty_series_as_failure() {
        let builder = PriceTableBuilder::new(FetchFailurePolicy::SkipFailed);
        let fetched = vec![
            (sym("AAA"), Ok(series("AAA", &[(date(2024, 1, 2), dec!(1))]))),
            (sym("EMP"), Ok(series("EMP", &[]))),
        ];

        let build = builder.build(fetched).unwrap();
        assert_eq!(build.table.symbols(), &[sym("AAA")]);
        assert_eq!(build.failures.len(), 1);
        assert_eq!(build.failures[0].symbol, sym("EMP"));
    }

    #[test]
    fn test_build_fails_when_every_symbol_failed() {
        let builder = PriceTableBuilder::new(FetchFailurePolicy::SkipFailed);
        let fetched = vec![(sym("ZZZ"), Err(FetchError::NotFound(sym("ZZZ"))))];
        assert!(matches!(
            builder.build(fetched),
            Err(AnalyticsError::FetchFailures(_))
        ));
    }

    #[test]
    fn test_build_preserves_requested_column_order() {
        let builder = PriceTableBuilder::new(FetchFailurePolicy::Abort);
        let fetched = vec![
            (sym("CCC"), Ok(series("CCC", &[(date(2024, 1, 2), dec!(3))]))),
            (sym("AAA"), Ok(series("AAA", &[(date(2024, 1, 2), dec!(1))]))),
            (sym("BBB"), Ok(series("BBB", &[(date(2024, 1, 2), dec!(2))]))),
        ];

        let build = builder.build(fetched).unwrap();
        assert_eq!(build.table.symbols(), &[sym("CCC"), sym("AAA"), sym("BBB")]);
        assert_eq!(build.table.column_of(&sym("AAA")), Some(&[Some(dec!(1))][..]));
    }
}
