use crate::correlation::{CorrelationAnalysis, CorrelationEngine};
use crate::error::AnalyticsError;
use crate::performance::{PerformanceEngine, PerformanceRecord};
use crate::report::{DashboardReport, ReportAssembler};
use crate::table::{parse_symbol_list, AlignedPriceTable, PriceTableBuilder, TableBuild};
use configuration::AnalysisSettings;
use core_types::{FetchError, PriceSeries, Symbol};

/// A stateless pipeline from fetched price histories to a `DashboardReport`.
///
/// The engine only holds its policy settings, performs no I/O and keeps no
/// state between calls, so one instance can serve concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine {
    settings: AnalysisSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Turns the user's ticker text into normalized symbols, before anything is fetched.
    pub fn parse_symbols(&self, text: &str) -> Result<Vec<Symbol>, AnalyticsError> {
        parse_symbol_list(text, self.settings.duplicates)
    }

    pub fn build_table(
        &self,
        fetched: Vec<(Symbol, Result<PriceSeries, FetchError>)>,
    ) -> Result<TableBuild, AnalyticsError> {
        PriceTableBuilder::new(self.settings.fetch_failures).build(fetched)
    }

    pub fn correlate(&self, table: &AlignedPriceTable) -> Result<CorrelationAnalysis, AnalyticsError> {
        CorrelationEngine::new(&self.settings).analyze(table)
    }

    pub fn performance(&self, table: &AlignedPriceTable) -> Vec<PerformanceRecord> {
        PerformanceEngine::new(&self.settings).evaluate(table)
    }

    /// The main entry point: aligns the fetched series, runs both engines and
    /// assembles the report.
    ///
    /// Only input and fetch problems fail the call. A correlation that cannot be
    /// computed (e.g. a single symbol) is reported inside the returned report
    /// while the performance table is still produced.
    ///
    /// # Arguments
    ///
    /// * `fetched` - One fetch outcome per requested symbol, in requested order.
    pub fn analyze(
        &self,
        fetched: Vec<(Symbol, Result<PriceSeries, FetchError>)>,
    ) -> Result<DashboardReport, AnalyticsError> {
        let TableBuild { table, failures } = self.build_table(fetched)?;
        tracing::info!(
            symbols = table.width(),
            rows = table.len(),
            skipped = failures.len(),
            "Running analysis."
        );

        let correlation = self.correlate(&table);
        if let Err(e) = &correlation {
            tracing::warn!(error = %e, "Correlation unavailable for this request.");
        }
        let records = self.performance(&table);

        Ok(ReportAssembler::new(self.settings.rounding).assemble(table, correlation, &records, failures))
    }
}
