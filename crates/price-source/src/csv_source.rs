use crate::error::SourceError;
use crate::PriceSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{FetchError, PricePoint, PriceSeries, Symbol};
use rust_decimal::Decimal;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

/// Reads price histories from a directory holding one `<SYMBOL>.csv` per instrument.
///
/// Files need a `Date` and a `Close` column (matched case-insensitively, other
/// columns are ignored). Dates may carry a time suffix as long as they start
/// with `YYYY-MM-DD`. Rows whose close is blank, `null` or `NaN` are skipped.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    directory: PathBuf,
}

impl CsvPriceSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, symbol: &Symbol) -> PathBuf {
        self.directory.join(format!("{}.csv", symbol))
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch(&self, symbol: &Symbol) -> Result<PriceSeries, FetchError> {
        let path = self.path_for(symbol);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::NotFound(symbol.clone()));
            }
            Err(e) => return Err(SourceError::from(e).into_fetch_error(symbol)),
        };

        let points = parse_prices(&text).map_err(|e| {
            tracing::warn!(%symbol, path = %path.display(), error = %e, "Unreadable price file.");
            e.into_fetch_error(symbol)
        })?;

        if points.is_empty() {
            return Err(FetchError::Empty(symbol.clone()));
        }

        tracing::debug!(%symbol, rows = points.len(), "Loaded price history.");
        Ok(PriceSeries::new(symbol.clone(), points))
    }
}

/// Parses `Date,Close` CSV text into price points.
pub fn parse_prices(text: &str) -> Result<Vec<PricePoint>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(SourceError::MissingColumn(name))
    };
    let date_col = column("date")?;
    let close_col = column("close")?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_close = record.get(close_col).unwrap_or("");
        if is_blank(raw_close) {
            continue;
        }
        let raw_date = record.get(date_col).unwrap_or("");

        let date = parse_date(raw_date).ok_or_else(|| SourceError::InvalidRow {
            line,
            message: format!("unparseable date '{}'", raw_date),
        })?;
        let close = Decimal::from_str(raw_close)
            .or_else(|_| Decimal::from_scientific(raw_close))
            .map_err(|_| SourceError::InvalidRow {
                line,
                message: format!("unparseable close '{}'", raw_close),
            })?;

        points.push(PricePoint::new(date, close));
    }

    Ok(points)
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("nan")
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prices_reads_date_and_close_columns() {
        let text = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-02,1,1,1,470.50,100\n\
                    2024-01-03 00:00:00-05:00,1,1,1,468.79,100\n";
        let points = parse_prices(text).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[1].close, Decimal::new(46879, 2));
    }

    #[test]
    fn test_parse_prices_skips_blank_closes() {
        let text = "date,close\n2024-01-02,\n2024-01-03,null\n2024-01-04,NaN\n2024-01-05,1.5e2\n";
        let points = parse_prices(text).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, Decimal::from(150));
    }

    #[test]
    fn test_parse_prices_requires_columns() {
        assert!(matches!(
            parse_prices("Day,Price\n2024-01-02,1\n"),
            Err(SourceError::MissingColumn("date"))
        ));
    }

    #[test]
    fn test_parse_prices_rejects_bad_rows() {
        let err = parse_prices("Date,Close\n01/02/2024,1\n").unwrap_err();
        assert!(matches!(err, SourceError::InvalidRow { line: 2, .. }));

        let err = parse_prices("Date,Close\n2024-01-02,abc\n").unwrap_err();
        assert!(matches!(err, SourceError::InvalidRow { .. }));
    }
}
