//! # Dashboard Analytics Engine
//!
//! This crate turns raw daily closing-price histories of a set of instruments into
//! the figures the dashboard shows: a correlation heatmap with a one-line summary,
//! and a table of returns over eight fixed horizons.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no network, file or database access. Price histories are
//!   fetched by the caller and handed in as `PriceSeries` values.
//! - **Stateless calculation:** the `AnalyticsEngine` holds only its
//!   `AnalysisSettings`. Every missing-data, tie-break and rounding rule is one of
//!   those settings rather than an implicit default.
//!
//! ## Pipeline
//!
//! 1. `table` aligns the series on the union of their dates.
//! 2. `correlation` computes the matrix and the most/least correlated pairs.
//! 3. `performance` (with `resample`) computes the per-horizon returns.
//! 4. `report` packages both into a `DashboardReport`.

// Declare the modules that constitute this crate.
pub mod correlation;
pub mod engine;
pub mod error;
pub mod performance;
pub mod report;
pub mod resample;
pub mod table;

// Re-export the key components to create a clean, public-facing API.
pub use correlation::{CorrelationAnalysis, CorrelationEngine, CorrelationMatrix, ExtremalPair};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use performance::{PerformanceEngine, PerformanceRecord};
pub use report::{
    CorrelationPanel, DashboardReport, PerformanceRow, PerformanceTable, ReportAssembler,
    SortColumn, SortOrder,
};
pub use table::{parse_symbol_list, AlignedPriceTable, PriceTableBuilder, SymbolFailure, TableBuild};
