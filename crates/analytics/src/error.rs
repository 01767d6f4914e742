use crate::table::SymbolFailure;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid symbol input: {0}")]
    InvalidSymbolInput(String),

    #[error("Failed to load price history: {}", describe_failures(.0))]
    FetchFailures(Vec<SymbolFailure>),

    #[error("Correlation needs at least two symbols, got {0}")]
    DegenerateCorrelation(usize),

    #[error("No pair of symbols has enough overlapping history to be correlated")]
    UndefinedCorrelation,
}

fn describe_failures(failures: &[SymbolFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.symbol, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}
