use async_trait::async_trait;
use core_types::{FetchError, PriceSeries, Symbol};
use futures::future::join_all;
use std::collections::HashMap;

pub mod csv_source;
pub mod error;

// --- Public API ---
pub use csv_source::CsvPriceSource;
pub use error::SourceError;

/// The interface the dashboard uses to obtain daily closing-price histories.
/// The analytics engine never calls it; the shell fetches first and hands the
/// results over, so the implementation (file-backed or in-memory) can be swapped.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns the full available history of `symbol`.
    async fn fetch(&self, symbol: &Symbol) -> Result<PriceSeries, FetchError>;
}

/// Fetches every symbol concurrently, keeping the requested order.
pub async fn fetch_all(
    source: &dyn PriceSource,
    symbols: &[Symbol],
) -> Vec<(Symbol, Result<PriceSeries, FetchError>)> {
    let results = join_all(symbols.iter().map(|symbol| source.fetch(symbol))).await;

    symbols.iter().cloned().zip(results).collect()
}

/// A fixed set of histories held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<Symbol, PriceSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol.clone(), series);
        self
    }
}

#[async_trait]
impl PriceSource for InMemoryPriceSource {
    async fn fetch(&self, symbol: &Symbol) -> Result<PriceSeries, FetchError> {
        match self.series.get(symbol) {
            Some(series) if series.is_empty() => Err(FetchError::Empty(symbol.clone())),
            Some(series) => Ok(series.clone()),
            None => Err(FetchError::NotFound(symbol.clone())),
        }
    }
}
