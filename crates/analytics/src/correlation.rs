//! Pairwise Pearson correlation across the columns of an aligned price table,
//! and selection of the most and least correlated pairs.

use crate::error::AnalyticsError;
use crate::table::AlignedPriceTable;
use configuration::{AnalysisSettings, CorrelationWindow, RoundingMode, TieBreak};
use core_types::Symbol;
use rust_decimal::prelude::*;
use serde::Serialize;

/// Square, symmetric correlation matrix in table column order.
///
/// A cell is `None` when the pair has fewer than two shared observations or
/// one side does not move over them. A diagonal cell is exactly `1.0` when its
/// column moves over the window, and `None` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    symbols: Vec<Symbol>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Rows of the matrix, suitable for a heatmap grid.
    pub fn values(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// `None` for an undefined cell or an out-of-range index.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }

    pub fn between(&self, a: &Symbol, b: &Symbol) -> Option<f64> {
        let row = self.symbols.iter().position(|s| s == a)?;
        let col = self.symbols.iter().position(|s| s == b)?;
        self.get(row, col)
    }
}

/// One unordered symbol pair; `symbol_a` precedes `symbol_b` in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremalPair {
    pub symbol_a: Symbol,
    pub symbol_b: Symbol,
    /// Signed Pearson coefficient. Ranking uses its absolute value.
    pub correlation: f64,
}

/// The matrix together with its most and least correlated pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationAnalysis {
    pub matrix: CorrelationMatrix,
    pub highest: ExtremalPair,
    pub lowest: ExtremalPair,
}

impl CorrelationAnalysis {
    /// The one-paragraph summary shown under the heatmap. Coefficients are
    /// printed as magnitudes; the signed values stay on the pairs.
    pub fn statement(&self, rounding: RoundingMode) -> String {
        format!(
            "The two symbols with the highest correlation are {} and {}. They have a correlation of {}. \
             The two symbols with the lowest correlation are {} and {}. They have a correlation of {}.",
            self.highest.symbol_a,
            self.highest.symbol_b,
            format_coefficient(self.highest.correlation.abs(), rounding),
            self.lowest.symbol_a,
            self.lowest.symbol_b,
            format_coefficient(self.lowest.correlation.abs(), rounding),
        )
    }
}

/// Rounds a coefficient to two decimals and prints it without trailing zeros,
/// keeping at least one fractional digit ("1.0", "0.5", "-0.37").
pub fn format_coefficient(value: f64, rounding: RoundingMode) -> String {
    match Decimal::from_f64(value) {
        Some(decimal) => {
            let rounded = decimal
                .round_dp_with_strategy(2, rounding.strategy())
                .normalize();
            if rounded.scale() == 0 {
                format!("{}.0", rounded)
            } else {
                rounded.to_string()
            }
        }
        None => format!("{:.2}", value),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine {
    window: CorrelationWindow,
    tie_break: TieBreak,
}

impl CorrelationEngine {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            window: settings.correlation_window,
            tie_break: settings.tie_break,
        }
    }

    /// Computes the matrix and the extremal pairs.
    ///
    /// Fails with `DegenerateCorrelation` for fewer than two columns and with
    /// `UndefinedCorrelation` when no off-diagonal cell has a value.
    pub fn analyze(&self, table: &AlignedPriceTable) -> Result<CorrelationAnalysis, AnalyticsError> {
        if table.width() < 2 {
            return Err(AnalyticsError::DegenerateCorrelation(table.width()));
        }

        let matrix = self.matrix(table);
        let (highest, lowest) = extremal_pairs(&matrix, self.tie_break)?;

        tracing::debug!(
            highest = %format!("{}/{}", highest.symbol_a, highest.symbol_b),
            lowest = %format!("{}/{}", lowest.symbol_a, lowest.symbol_b),
            "Correlation extremes selected."
        );

        Ok(CorrelationAnalysis {
            matrix,
            highest,
            lowest,
        })
    }

    /// Computes the full matrix. Each unordered pair is evaluated once and
    /// mirrored, so `m[i][j]` and `m[j][i]` are the same value.
    pub fn matrix(&self, table: &AlignedPriceTable) -> CorrelationMatrix {
        let n = table.width();
        let columns: Vec<Vec<Option<f64>>> = table
            .columns()
            .iter()
            .map(|column| column.iter().map(|cell| cell.and_then(|c| c.to_f64())).collect())
            .collect();

        let common_rows: Option<Vec<bool>> = match self.window {
            CorrelationWindow::PairwiseComplete => None,
            CorrelationWindow::CommonDates => Some(
                (0..table.len())
                    .map(|row| columns.iter().all(|c| c[row].is_some()))
                    .collect(),
            ),
        };

        let paired = |i: usize, j: usize| -> Vec<(f64, f64)> {
            columns[i]
                .iter()
                .zip(&columns[j])
                .enumerate()
                .filter(|(row, _)| common_rows.as_ref().is_none_or(|rows| rows[*row]))
                .filter_map(|(_, (x, y))| Some(((*x)?, (*y)?)))
                .collect()
        };

        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            values[i][i] = pearson(&paired(i, i)).map(|_| 1.0);
            for j in (i + 1)..n {
                let r = pearson(&paired(i, j));
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            symbols: table.symbols().to_vec(),
            values,
        }
    }
}

/// Pearson's r over paired observations, two-pass for numerical stability.
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Picks the highest and lowest |r| among upper-triangle cells (`j > i`).
///
/// Undefined cells are skipped. Ties on |r| are resolved by `tie_break`.
pub fn extremal_pairs(
    matrix: &CorrelationMatrix,
    tie_break: TieBreak,
) -> Result<(ExtremalPair, ExtremalPair), AnalyticsError> {
    let n = matrix.size();
    if n < 2 {
        return Err(AnalyticsError::DegenerateCorrelation(n));
    }

    let symbols = matrix.symbols();
    let candidates: Vec<(usize, usize, f64)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .filter_map(|(i, j)| matrix.get(i, j).map(|r| (i, j, r)))
        .collect();

    // Whether `challenger` should replace `incumbent` when their |r| are equal.
    let wins_tie = |challenger: &(usize, usize, f64), incumbent: &(usize, usize, f64)| match tie_break {
        TieBreak::FirstEncountered => false,
        TieBreak::Lexicographic => {
            (&symbols[challenger.0], &symbols[challenger.1])
                < (&symbols[incumbent.0], &symbols[incumbent.1])
        }
    };

    let mut highest: Option<(usize, usize, f64)> = None;
    let mut lowest: Option<(usize, usize, f64)> = None;
    for candidate in &candidates {
        let magnitude = candidate.2.abs();

        highest = match highest {
            Some(best) if magnitude < best.2.abs() => Some(best),
            Some(best) if magnitude == best.2.abs() && !wins_tie(candidate, &best) => Some(best),
            _ => Some(*candidate),
        };
        lowest = match lowest {
            Some(best) if magnitude > best.2.abs() => Some(best),
            Some(best) if magnitude == best.2.abs() && !wins_tie(candidate, &best) => Some(best),
            _ => Some(*candidate),
        };
    }

    let to_pair = |(i, j, r): (usize, usize, f64)| ExtremalPair {
        symbol_a: symbols[i].clone(),
        symbol_b: symbols[j].clone(),
        correlation: r,
    };

    match (highest, lowest) {
        (Some(high), Some(low)) => Ok((to_pair(high), to_pair(low))),
        _ => {
            tracing::warn!(symbols = n, "No symbol pair has a defined correlation.");
            Err(AnalyticsError::UndefinedCorrelation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{PricePoint, PriceSeries};

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn table(columns: &[(&str, &[Option<i64>])]) -> AlignedPriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: Vec<PriceSeries> = columns
            .iter()
            .map(|(name, closes)| {
                let points = closes.iter().enumerate().filter_map(|(k, c)| {
                    c.map(|c| PricePoint::new(start + chrono::Days::new(k as u64), Decimal::from(c)))
                });
                PriceSeries::new(sym(name), points)
            })
            .collect();
        AlignedPriceTable::from_series(&series)
    }

    fn matrix(symbols: &[&str], values: Vec<Vec<Option<f64>>>) -> CorrelationMatrix {
        CorrelationMatrix {
            symbols: symbols.iter().map(|s| sym(s)).collect(),
            values,
        }
    }

    #[test]
    fn test_pearson_of_linear_relations() {
        let up: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 3.0 * i as f64 + 1.0)).collect();
        let down: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, -2.0 * i as f64)).collect();
        assert!((pearson(&up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_for_flat_or_short_input() {
        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (2.0, 2.0), (3.0, 2.0)]), None);
    }

    #[test]
    fn test_matrix_uses_pairwise_complete_rows() {
        // CCC is missing on the rows where AAA and BBB disagree.
        let t = table(&[
            ("AAA", &[Some(1), Some(2), Some(3), Some(4), Some(5)]),
            ("BBB", &[Some(1), Some(2), Some(9), Some(4), Some(5)]),
            ("CCC", &[Some(2), Some(4), None, Some(8), Some(10)]),
        ]);
        let engine = CorrelationEngine::new(&AnalysisSettings::default());
        let m = engine.matrix(&t);

        assert!((m.get(0, 2).unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get(1, 2).unwrap() - 1.0).abs() < 1e-12);
        assert!(m.get(0, 1).unwrap() < 0.9);
    }

    #[test]
    fn test_common_dates_window_drops_rows_missing_anywhere() {
        let t = table(&[
            ("AAA", &[Some(1), Some(2), Some(3), Some(4), Some(5)]),
            ("BBB", &[Some(1), Some(2), Some(9), Some(4), Some(5)]),
            ("CCC", &[Some(2), Some(4), None, Some(8), Some(10)]),
        ]);
        let settings = AnalysisSettings {
            correlation_window: CorrelationWindow::CommonDates,
            ..AnalysisSettings::default()
        };
        let m = CorrelationEngine::new(&settings).matrix(&t);

        // Without row 2, AAA and BBB are identical.
        assert!((m.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_is_exactly_symmetric_with_unit_diagonal() {
        let t = table(&[
            ("AAA", &[Some(10), Some(12), Some(11), Some(15), Some(14)]),
            ("BBB", &[Some(3), Some(1), Some(4), Some(1), Some(5)]),
            ("CCC", &[Some(7), None, Some(8), Some(6), Some(9)]),
        ]);
        let m = CorrelationEngine::new(&AnalysisSettings::default()).matrix(&t);

        for i in 0..3 {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn test_flat_column_yields_undefined_cells() {
        let t = table(&[
            ("AAA", &[Some(1), Some(2), Some(3)]),
            ("FLT", &[Some(5), Some(5), Some(5)]),
        ]);
        let engine = CorrelationEngine::new(&AnalysisSettings::default());
        let m = engine.matrix(&t);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(1, 1), None);
        assert_eq!(engine.analyze(&t), Err(AnalyticsError::UndefinedCorrelation));
    }

    #[test]
    fn test_single_observation_column_has_no_diagonal() {
        let t = table(&[
            ("AAA", &[Some(1), Some(2), Some(3)]),
            ("ONE", &[None, None, Some(7)]),
        ]);
        let m = CorrelationEngine::new(&AnalysisSettings::default()).matrix(&t);
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.get(0, 1), None);
    }

    #[test]
    fn test_out_of_range_lookups_are_none() {
        let m = matrix(
            &["AAA", "BBB"],
            vec![vec![Some(1.0), Some(0.4)], vec![Some(0.4), Some(1.0)]],
        );
        assert_eq!(m.get(0, 1), Some(0.4));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 5), None);
        assert_eq!(m.between(&sym("AAA"), &sym("ZZZ")), None);
    }

    #[test]
    fn test_extremes_rank_by_absolute_value() {
        let m = matrix(
            &["AAA", "BBB", "CCC"],
            vec![
                vec![Some(1.0), Some(-0.9), Some(0.2)],
                vec![Some(-0.9), Some(1.0), Some(0.5)],
                vec![Some(0.2), Some(0.5), Some(1.0)],
            ],
        );
        let (high, low) = extremal_pairs(&m, TieBreak::Lexicographic).unwrap();
        assert_eq!((high.symbol_a.as_str(), high.symbol_b.as_str()), ("AAA", "BBB"));
        assert_eq!(high.correlation, -0.9);
        assert_eq!((low.symbol_a.as_str(), low.symbol_b.as_str()), ("AAA", "CCC"));
    }

    #[test]
    fn test_tie_break_policies() {
        // Column order ZZZ, BBB, AAA: pairs enumerate as (ZZZ,BBB), (ZZZ,AAA), (BBB,AAA).
        let m = matrix(
            &["ZZZ", "BBB", "AAA"],
            vec![
                vec![Some(1.0), Some(0.5), Some(0.5)],
                vec![Some(0.5), Some(1.0), Some(-0.5)],
                vec![Some(0.5), Some(-0.5), Some(1.0)],
            ],
        );

        let (high, low) = extremal_pairs(&m, TieBreak::FirstEncountered).unwrap();
        assert_eq!((high.symbol_a.as_str(), high.symbol_b.as_str()), ("ZZZ", "BBB"));
        assert_eq!((low.symbol_a.as_str(), low.symbol_b.as_str()), ("ZZZ", "BBB"));

        let (high, low) = extremal_pairs(&m, TieBreak::Lexicographic).unwrap();
        assert_eq!((high.symbol_a.as_str(), high.symbol_b.as_str()), ("BBB", "AAA"));
        assert_eq!((low.symbol_a.as_str(), low.symbol_b.as_str()), ("BBB", "AAA"));
    }

    #[test]
    fn test_extremes_skip_undefined_cells() {
        let m = matrix(
            &["AAA", "BBB", "CCC"],
            vec![
                vec![Some(1.0), None, Some(0.3)],
                vec![None, Some(1.0), Some(0.8)],
                vec![Some(0.3), Some(0.8), Some(1.0)],
            ],
        );
        let (high, low) = extremal_pairs(&m, TieBreak::Lexicographic).unwrap();
        assert_eq!(high.correlation, 0.8);
        assert_eq!(low.correlation, 0.3);
    }

    #[test]
    fn test_single_column_is_degenerate() {
        let t = table(&[("AAA", &[Some(1), Some(2)])]);
        let engine = CorrelationEngine::new(&AnalysisSettings::default());
        assert_eq!(engine.analyze(&t), Err(AnalyticsError::DegenerateCorrelation(1)));
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(1.0, RoundingMode::HalfEven), "1.0");
        assert_eq!(format_coefficient(0.5, RoundingMode::HalfEven), "0.5");
        assert_eq!(format_coefficient(-0.3712, RoundingMode::HalfEven), "-0.37");
        assert_eq!(format_coefficient(0.125, RoundingMode::HalfEven), "0.12");
        assert_eq!(format_coefficient(0.125, RoundingMode::HalfAwayFromZero), "0.13");
        assert_eq!(format_coefficient(0.999, RoundingMode::HalfEven), "1.0");
    }

    #[test]
    fn test_statement_template() {
        let m = matrix(
            &["SPY", "VNQ", "GBTC"],
            vec![
                vec![Some(1.0), Some(0.87), Some(0.12)],
                vec![Some(0.87), Some(1.0), Some(0.2)],
                vec![Some(0.12), Some(0.2), Some(1.0)],
            ],
        );
        let (highest, lowest) = extremal_pairs(&m, TieBreak::Lexicographic).unwrap();
        let analysis = CorrelationAnalysis { matrix: m, highest, lowest };

        assert_eq!(
            analysis.statement(RoundingMode::HalfEven),
            "The two symbols with the highest correlation are SPY and VNQ. They have a correlation of 0.87. \
             The two symbols with the lowest correlation are SPY and GBTC. They have a correlation of 0.12."
        );
    }

    #[test]
    fn test_statement_prints_magnitudes() {
        let m = matrix(
            &["AAA", "BBB", "CCC"],
            vec![
                vec![Some(1.0), Some(-0.934), Some(0.4)],
                vec![Some(-0.934), Some(1.0), Some(-0.051)],
                vec![Some(0.4), Some(-0.051), Some(1.0)],
            ],
        );
        let (highest, lowest) = extremal_pairs(&m, TieBreak::Lexicographic).unwrap();
        assert_eq!(highest.correlation, -0.934);
        let analysis = CorrelationAnalysis { matrix: m, highest, lowest };

        assert_eq!(
            analysis.statement(RoundingMode::HalfEven),
            "The two symbols with the highest correlation are AAA and BBB. They have a correlation of 0.93. \
             The two symbols with the lowest correlation are BBB and CCC. They have a correlation of 0.05."
        );
    }
}
