use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A normalized instrument identifier (e.g. "SPY", "BRK-B", "^GSPC").
///
/// Whitespace is removed and letters are upper-cased, so `" spy "` and `"SPY"`
/// are the same symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "symbol is empty".to_string(),
            ));
        }

        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_')))
        {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                format!("'{}' contains unsupported character '{}'", raw.trim(), bad),
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// The full daily closing-price history of one symbol, in ascending date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from observations in any order.
    /// When a date appears more than once, the last supplied close is kept.
    pub fn new(symbol: Symbol, points: impl IntoIterator<Item = PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, Decimal> =
            points.into_iter().map(|p| (p.date, p.close)).collect();
        let points = by_date
            .into_iter()
            .map(|(date, close)| PricePoint { date, close })
            .collect();
        Self { symbol, points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_symbol_is_trimmed_and_upper_cased() {
        assert_eq!(Symbol::parse("  spy ").unwrap().as_str(), "SPY");
        assert_eq!(Symbol::parse("brk-b").unwrap().as_str(), "BRK-B");
        assert_eq!(Symbol::parse("^gspc").unwrap().as_str(), "^GSPC");
        assert_eq!(Symbol::parse("g btc").unwrap().as_str(), "GBTC");
    }

    #[test]
    fn test_symbol_rejects_empty_and_bad_characters() {
        assert!(Symbol::parse("   ").is_err());
        assert!(Symbol::parse("SP/Y").is_err());
        assert!(Symbol::parse("$$$").is_err());
    }

    #[test]
    fn test_symbol_deserializes_through_normalization() {
        let symbol: Symbol = serde_json::from_str("\" vnq\"").unwrap();
        assert_eq!(symbol.as_str(), "VNQ");
        assert!(serde_json::from_str::<Symbol>("\"a b!\"").is_err());
    }

    #[test]
    fn test_series_sorts_and_keeps_last_duplicate() {
        let symbol = Symbol::parse("AAA").unwrap();
        let series = PriceSeries::new(
            symbol,
            vec![
                PricePoint::new(date(2024, 1, 3), dec!(12)),
                PricePoint::new(date(2024, 1, 1), dec!(10)),
                PricePoint::new(date(2024, 1, 3), dec!(13)),
            ],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.points()[1].close, dec!(13));
    }
}
