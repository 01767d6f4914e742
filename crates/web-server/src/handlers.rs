use crate::{error::AppError, AppState};
use analytics::{DashboardReport, SortColumn, SortOrder};
use axum::{
    extract::{Query, State},
    Json,
};
use price_source::fetch_all;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    /// Comma-separated tickers; the configured defaults are used when absent.
    pub tickers: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/analysis
/// Fetches the requested histories and returns the full dashboard report.
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<DashboardReport>, AppError> {
    let sort = parse_sort(query.sort.as_deref(), query.order.as_deref())?;

    let tickers = match query.tickers.as_deref() {
        Some(text) if !text.trim().is_empty() => text,
        _ => state.default_tickers.as_str(),
    };
    let symbols = state.engine.parse_symbols(tickers)?;

    let fetched = fetch_all(state.source.as_ref(), &symbols).await;
    let mut report = state.engine.analyze(fetched)?;

    if let Some((column, order)) = sort {
        report.performance.sort_by(column, order);
    }

    tracing::info!(symbols = report.symbols.len(), "Served analysis.");
    Ok(Json(report))
}

fn parse_sort(
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Option<(SortColumn, SortOrder)>, AppError> {
    let order = match order.map(|o| o.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("asc") => SortOrder::Ascending,
        Some("desc") => SortOrder::Descending,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown sort order '{}', expected 'asc' or 'desc'",
                other
            )))
        }
    };

    match sort {
        None => Ok(None),
        Some(name) if name.trim().is_empty() => Ok(None),
        Some(name) => SortColumn::parse(name)
            .map(|column| Some((column, order)))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown sort column '{}'", name))),
    }
}
