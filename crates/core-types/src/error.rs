use crate::structs::Symbol;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// Why a price history could not be obtained for one symbol.
///
/// Returned by whatever collaborator supplies `PriceSeries`; the analytics
/// crate reports these per symbol and never substitutes data for them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No price history exists for {0}")]
    NotFound(Symbol),

    #[error("Price history for {0} is unavailable: {1}")]
    Unavailable(Symbol, String),

    #[error("Price history for {0} is empty")]
    Empty(Symbol),
}

impl FetchError {
    pub fn symbol(&self) -> &Symbol {
        match self {
            FetchError::NotFound(symbol)
            | FetchError::Unavailable(symbol, _)
            | FetchError::Empty(symbol) => symbol,
        }
    }
}
