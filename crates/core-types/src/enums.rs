use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed lookback windows reported for every symbol.
///
/// Variant order is the column order of the performance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReturnHorizon {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "10Y")]
    TenYears,
}

impl ReturnHorizon {
    pub const ALL: [ReturnHorizon; 8] = [
        ReturnHorizon::OneDay,
        ReturnHorizon::OneMonth,
        ReturnHorizon::ThreeMonths,
        ReturnHorizon::YearToDate,
        ReturnHorizon::OneYear,
        ReturnHorizon::ThreeYears,
        ReturnHorizon::FiveYears,
        ReturnHorizon::TenYears,
    ];

    /// The column header shown in the performance table.
    pub fn label(&self) -> &'static str {
        match self {
            ReturnHorizon::OneDay => "1-Day",
            ReturnHorizon::OneMonth => "1-Month",
            ReturnHorizon::ThreeMonths => "3-Month",
            ReturnHorizon::YearToDate => "YTD",
            ReturnHorizon::OneYear => "1-Year",
            ReturnHorizon::ThreeYears => "3-Year",
            ReturnHorizon::FiveYears => "5-Year",
            ReturnHorizon::TenYears => "10-Year",
        }
    }

    /// Looks a horizon up by its table label or its short code, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL.into_iter().find(|h| {
            h.label().eq_ignore_ascii_case(wanted) || h.code().eq_ignore_ascii_case(wanted)
        })
    }

    /// The short code used on the wire (e.g. "3M").
    pub fn code(&self) -> &'static str {
        match self {
            ReturnHorizon::OneDay => "1D",
            ReturnHorizon::OneMonth => "1M",
            ReturnHorizon::ThreeMonths => "3M",
            ReturnHorizon::YearToDate => "YTD",
            ReturnHorizon::OneYear => "1Y",
            ReturnHorizon::ThreeYears => "3Y",
            ReturnHorizon::FiveYears => "5Y",
            ReturnHorizon::TenYears => "10Y",
        }
    }
}

impl fmt::Display for ReturnHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
