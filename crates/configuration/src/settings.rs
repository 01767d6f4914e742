use rust_decimal::RoundingStrategy;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub data: DataSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// The knobs of the analytics pipeline. Every missing-data and tie policy is
/// spelled out here instead of being left to a numeric library's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub correlation_window: CorrelationWindow,
    pub fill: FillPolicy,
    pub tie_break: TieBreak,
    pub duplicates: DuplicatePolicy,
    pub rounding: RoundingMode,
    pub fetch_failures: FetchFailurePolicy,
}

/// Which dates feed the correlation of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationWindow {
    /// Dates on which both symbols of the pair have a close.
    #[default]
    PairwiseComplete,
    /// Dates on which every symbol in the table has a close.
    CommonDates,
}

/// How a calendar period's closing value is derived when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Last observation on or before the period end, carried across empty periods.
    #[default]
    ForwardFill,
    /// Last observation inside the period; an empty period has no value.
    WithinPeriod,
}

/// How equally extreme pairs are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Smallest `(symbol_a, symbol_b)` in lexicographic order wins.
    #[default]
    Lexicographic,
    /// Earliest pair in row-major upper-triangle order wins.
    FirstEncountered,
}

/// What to do when the same symbol is requested twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence and drop later ones.
    #[default]
    Collapse,
    /// Refuse the request.
    Reject,
}

/// Midpoint rule for two-decimal rounding of reported figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfEven,
    HalfAwayFromZero,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Whether one failed fetch sinks the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailurePolicy {
    #[default]
    Abort,
    /// Analyse the symbols that loaded and report the rest as failures.
    SkipFailed,
}

/// Where price histories are read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding one `<SYMBOL>.csv` file per instrument.
    pub prices_dir: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            prices_dir: PathBuf::from("data/prices"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    /// Tickers analysed when a request does not name any.
    pub default_tickers: String,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            default_tickers: "spy, gbtc, vnq, pltr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, a daily rolling log file is written here as well.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
