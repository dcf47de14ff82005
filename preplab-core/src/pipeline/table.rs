//! Derived output tables, keyed by (instrument, date).
//!
//! Both tables are immutable results of the pipeline; NaN marks an
//! undefined value (insufficient trailing history or a null observation).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature rows for one instrument: a date index plus one value vector
/// per table column (column-major, parallel to `FeatureTable::columns`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBlock {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Vec<f64>>,
}

impl FeatureBlock {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Drop rows past `len`, in every column.
    pub fn truncate(&mut self, len: usize) {
        self.dates.truncate(len);
        for column in &mut self.values {
            column.truncate(len);
        }
    }
}

/// Feature table: raw fields passed through plus derived indicators,
/// indexed by (instrument, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Column names in output order: `$`-prefixed raw fields first, then
    /// derived indicator columns.
    pub columns: Vec<String>,
    pub instruments: BTreeMap<String, FeatureBlock>,
}

impl FeatureTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (instrument, date, column). `None` when the row or column
    /// does not exist; NaN when the row exists but the value is undefined.
    pub fn get(&self, instrument: &str, date: NaiveDate, column: &str) -> Option<f64> {
        let block = self.instruments.get(instrument)?;
        let row = block.dates.iter().position(|d| *d == date)?;
        let col = self.column_index(column)?;
        Some(block.values[col][row])
    }

    pub fn row_count(&self) -> usize {
        self.instruments.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.values().all(|b| b.is_empty())
    }
}

/// Label values for one instrument. Covers every date except the
/// instrument's last (no future observation exists there).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelBlock {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl LabelBlock {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Single-column label table: next-day return keyed by (instrument, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelTable {
    pub instruments: BTreeMap<String, LabelBlock>,
}

impl LabelTable {
    pub fn get(&self, instrument: &str, date: NaiveDate) -> Option<f64> {
        let block = self.instruments.get(instrument)?;
        let row = block.dates.iter().position(|d| *d == date)?;
        Some(block.values[row])
    }

    pub fn row_count(&self) -> usize {
        self.instruments.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.values().all(|b| b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_table() -> FeatureTable {
        let mut instruments = BTreeMap::new();
        instruments.insert(
            "X".to_string(),
            FeatureBlock {
                dates: vec![d(1), d(2), d(3)],
                values: vec![vec![1.0, 2.0, 3.0], vec![f64::NAN, 20.0, 30.0]],
            },
        );
        FeatureTable {
            columns: vec!["$close".into(), "MA2".into()],
            instruments,
        }
    }

    #[test]
    fn get_by_key() {
        let t = sample_table();
        assert_eq!(t.get("X", d(2), "$close"), Some(2.0));
        assert_eq!(t.get("X", d(2), "MA2"), Some(20.0));
        assert!(t.get("X", d(1), "MA2").unwrap().is_nan());
        assert_eq!(t.get("X", d(4), "$close"), None);
        assert_eq!(t.get("Y", d(1), "$close"), None);
        assert_eq!(t.get("X", d(1), "nope"), None);
    }

    #[test]
    fn truncate_drops_trailing_rows_in_every_column() {
        let mut t = sample_table();
        t.instruments.get_mut("X").unwrap().truncate(2);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.get("X", d(3), "$close"), None);
        assert_eq!(t.get("X", d(2), "MA2"), Some(20.0));
    }

    #[test]
    fn row_count_sums_instruments() {
        let mut t = sample_table();
        t.instruments.insert(
            "Y".to_string(),
            FeatureBlock {
                dates: vec![d(1)],
                values: vec![vec![9.0], vec![f64::NAN]],
            },
        );
        assert_eq!(t.row_count(), 4);
    }
}
