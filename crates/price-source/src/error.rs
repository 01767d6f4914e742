use core_types::{FetchError, Symbol};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse price file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Price file has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Invalid data on line {line}: {message}")]
    InvalidRow { line: u64, message: String },
}

impl SourceError {
    /// Every source problem surfaces to the analytics layer as an unavailable history.
    pub fn into_fetch_error(self, symbol: &Symbol) -> FetchError {
        FetchError::Unavailable(symbol.clone(), self.to_string())
    }
}
