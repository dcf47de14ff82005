//! Raw panel fields.
//!
//! The provider exposes up to eight daily fields per instrument. Tabular
//! output uses `$`-prefixed column names (`$open`, ..., `$vwap`); parsing
//! accepts the prefix-less form as well, case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw per-instrument daily field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// Price adjustment factor.
    Factor,
    /// Day-over-day change.
    Change,
    /// Volume-weighted average price.
    Vwap,
}

impl Field {
    /// All fields, in canonical column order.
    pub const ALL: [Field; 8] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::Factor,
        Field::Change,
        Field::Vwap,
    ];

    /// The `$`-prefixed column name used in all tabular output.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Open => "$open",
            Field::High => "$high",
            Field::Low => "$low",
            Field::Close => "$close",
            Field::Volume => "$volume",
            Field::Factor => "$factor",
            Field::Change => "$change",
            Field::Vwap => "$vwap",
        }
    }

    /// Parse a field from a column header. Accepts `open`, `$open`,
    /// `Open`, etc. Returns `None` for unknown headers.
    pub fn parse(header: &str) -> Option<Field> {
        let name = header.trim().trim_start_matches('$').to_ascii_lowercase();
        match name.as_str() {
            "open" => Some(Field::Open),
            "high" => Some(Field::High),
            "low" => Some(Field::Low),
            "close" => Some(Field::Close),
            "volume" => Some(Field::Volume),
            "factor" => Some(Field::Factor),
            "change" => Some(Field::Change),
            "vwap" => Some(Field::Vwap),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}
