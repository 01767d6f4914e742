use analytics::{AnalyticsEngine, CorrelationPanel, DashboardReport, SortColumn, SortOrder};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use configuration::Config;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use price_source::{CsvPriceSource, PriceSource};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// The main entry point for the correlation dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment overrides from a .env file if one exists
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => web_server::run_server(&config).await,
        Commands::Analyze(args) => handle_analyze(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Cross-asset correlation and multi-horizon performance analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP dashboard API.
    Serve,
    /// Analyze a set of tickers and print the results.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Comma-separated tickers (e.g., "spy, gbtc, vnq"). Defaults to the configured list.
    #[arg(long)]
    tickers: Option<String>,

    /// Column to sort the performance table by ("Asset" or a horizon such as "1-Year").
    #[arg(long)]
    sort: Option<String>,

    #[arg(long, value_enum, default_value_t = Order::Asc)]
    order: Order,

    /// Print the full report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        }
    }
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

/// Fetches every requested history, runs the pipeline and prints the report.
async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let engine = AnalyticsEngine::new(config.analysis);
    let tickers = requested_tickers(args.tickers.as_deref(), &config.server.default_tickers);
    let symbols = engine.parse_symbols(tickers)?;

    let sort = match args.sort.as_deref() {
        Some(name) => Some(
            SortColumn::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown sort column '{}'", name))?,
        ),
        None => None,
    };

    let source = CsvPriceSource::new(config.data.prices_dir.clone());

    // Set up the progress bar
    let progress_bar = ProgressBar::new(symbols.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let fetched = join_all(symbols.iter().map(|symbol| {
        let pb = progress_bar.clone();
        let source = &source;
        async move {
            let result = source.fetch(symbol).await;
            pb.inc(1);
            pb.set_message(format!("Loaded {}", symbol));
            (symbol.clone(), result)
        }
    }))
    .await;

    progress_bar.finish_with_message("Histories loaded");

    let mut report = engine.analyze(fetched)?;
    tracing::info!(
        symbols = report.symbols.len(),
        failures = report.failures.len(),
        "Analysis complete."
    );
    if let Some(column) = sort {
        report.performance.sort_by(column, args.order.into());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// The `--tickers` text, or the configured defaults when it is absent or blank.
fn requested_tickers<'a>(flag: Option<&'a str>, defaults: &'a str) -> &'a str {
    match flag {
        Some(text) if !text.trim().is_empty() => text,
        _ => defaults,
    }
}

fn print_report(report: &DashboardReport) {
    for failure in &report.failures {
        println!("Skipped {}: {}", failure.symbol, failure.reason);
    }

    match &report.correlation {
        CorrelationPanel::Ready { summary, .. } => println!("\n{}\n", summary),
        CorrelationPanel::Unavailable { reason } => {
            println!("\nCorrelation unavailable: {}\n", reason)
        }
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(&report.performance.columns);

    for row in &report.performance.rows {
        let mut cells = vec![Cell::new(row.asset.as_str())];
        cells.extend(row.values.iter().map(|value| Cell::new(format_percent(*value))));
        table.add_row(cells);
    }

    println!("{table}");
}

fn format_percent(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "-".to_string(),
    }
}
