//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources so the
//! pipeline can be fed from a local store in production and from a fixed
//! panel in tests. Providers do not retry; a retrieval failure is an
//! input error for the caller.

use crate::domain::Panel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Data region — selects the store subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Cn,
    Us,
}

impl Region {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Region::Cn => "cn",
            Region::Us => "us",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cn" => Ok(Region::Cn),
            "us" => Ok(Region::Us),
            other => Err(format!("unknown region '{other}' (expected cn or us)")),
        }
    }
}

/// Structured error types for data access.
///
/// Designed to be displayable as-is in CLI output.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider initialization failed: {0}")]
    Initialization(String),

    #[error("malformed data for instrument '{instrument}': {reason}")]
    Malformed { instrument: String, reason: String },

    #[error("unknown instrument set '{name}' — no {path} file")]
    UnknownInstrumentSet { name: String, path: String },

    #[error("store I/O error: {0}")]
    Io(String),
}

/// Trait for market-data providers.
///
/// Given instrument identifiers and an inclusive date range, return a
/// panel of daily series or fail. Instruments without data are omitted
/// from the panel (partial panels are non-fatal at this layer).
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily field series for the given instruments and range.
    fn fetch(
        &self,
        instruments: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Panel, ProviderError>;
}
