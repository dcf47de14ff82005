//! Local-store provider.
//!
//! Layout: `{root}/{region}/{INSTRUMENT}.csv`, one file per instrument,
//! with a `date` column (YYYY-MM-DD) plus any subset of the eight field
//! columns (`open`, ..., `vwap`, `$`-prefix optional). Unknown columns
//! are ignored; empty or non-numeric cells become NaN.
//!
//! The store is populated by external download tooling; this provider
//! only reads it.

use super::provider::{MarketDataProvider, ProviderError, Region};
use crate::domain::{Field, InstrumentSeries, Panel};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LocalStoreProvider {
    root: PathBuf,
    region: Region,
}

impl LocalStoreProvider {
    /// Open the store for a region.
    ///
    /// Fails with `ProviderError::Initialization` when the store root or
    /// the region directory does not exist.
    pub fn new(root: impl Into<PathBuf>, region: Region) -> Result<Self, ProviderError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ProviderError::Initialization(format!(
                "store root '{}' does not exist — populate it with the download tooling first",
                root.display()
            )));
        }
        let region_dir = root.join(region.dir_name());
        if !region_dir.is_dir() {
            return Err(ProviderError::Initialization(format!(
                "region directory '{}' does not exist",
                region_dir.display()
            )));
        }
        Ok(Self { root, region })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Directory holding this region's instrument files.
    pub fn region_dir(&self) -> PathBuf {
        self.root.join(self.region.dir_name())
    }

    fn instrument_path(&self, instrument: &str) -> PathBuf {
        self.region_dir().join(format!("{instrument}.csv"))
    }

    /// Read and canonicalize one instrument file.
    fn load_instrument(&self, instrument: &str) -> Result<InstrumentSeries, ProviderError> {
        let path = self.instrument_path(instrument);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| ProviderError::Io(format!(
            "open {}: {e}",
            path.display()
        )))?;

        let headers = reader
            .headers()
            .map_err(|e| ProviderError::Malformed {
                instrument: instrument.to_string(),
                reason: format!("read header: {e}"),
            })?
            .clone();

        let date_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("date"))
            .ok_or_else(|| ProviderError::Malformed {
                instrument: instrument.to_string(),
                reason: "no 'date' column".to_string(),
            })?;

        // Map each field column index to its Field, first header wins.
        let mut field_cols: Vec<(usize, Field)> = Vec::new();
        for (i, h) in headers.iter().enumerate() {
            if let Some(f) = Field::parse(h) {
                if !field_cols.iter().any(|(_, seen)| *seen == f) {
                    field_cols.push((i, f));
                }
            }
        }

        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut columns: BTreeMap<Field, Vec<f64>> =
            field_cols.iter().map(|(_, f)| (*f, Vec::new())).collect();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ProviderError::Malformed {
                instrument: instrument.to_string(),
                reason: format!("row {}: {e}", row_idx + 1),
            })?;

            let raw_date = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                ProviderError::Malformed {
                    instrument: instrument.to_string(),
                    reason: format!("row {}: bad date '{raw_date}': {e}", row_idx + 1),
                }
            })?;
            dates.push(date);

            for (col, field) in &field_cols {
                let cell = record.get(*col).unwrap_or("").trim();
                let value = cell.parse::<f64>().unwrap_or(f64::NAN);
                columns
                    .get_mut(field)
                    .expect("column map covers every mapped field")
                    .push(value);
            }
        }

        Ok(InstrumentSeries::new(dates, columns))
    }
}

impl MarketDataProvider for LocalStoreProvider {
    fn name(&self) -> &str {
        "local_store"
    }

    fn fetch(
        &self,
        instruments: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Panel, ProviderError> {
        let mut panel = Panel::new();

        for instrument in instruments {
            let path = self.instrument_path(instrument);
            if !path.is_file() {
                warn!("no data file for instrument '{instrument}', skipping");
                continue;
            }

            let series = self.load_instrument(instrument)?;
            let sliced = series.slice_range(start, end);
            if sliced.is_empty() {
                warn!("instrument '{instrument}' has no rows in {start}..{end}, skipping");
                continue;
            }

            debug!(
                "loaded '{instrument}': {} rows, {} fields",
                sliced.len(),
                sliced.present_fields().count()
            );
            panel.insert(instrument.clone(), sliced);
        }

        Ok(panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_store(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let cn = dir.path().join("cn");
        fs::create_dir_all(&cn).unwrap();
        for (name, content) in files {
            fs::write(cn.join(format!("{name}.csv")), content).unwrap();
        }
        dir
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn missing_root_fails_initialization() {
        let err = LocalStoreProvider::new("/nonexistent/store", Region::Cn).unwrap_err();
        assert!(matches!(err, ProviderError::Initialization(_)));
    }

    #[test]
    fn missing_region_dir_fails_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalStoreProvider::new(dir.path(), Region::Us).unwrap_err();
        assert!(matches!(err, ProviderError::Initialization(_)));
    }

    #[test]
    fn fetch_parses_fields_and_range() {
        let store = write_store(&[(
            "SH600000",
            "date,open,close,volume\n\
             2024-01-01,9.5,10.0,1000\n\
             2024-01-02,10.0,10.5,1100\n\
             2024-01-03,10.5,11.0,1200\n",
        )]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let panel = provider
            .fetch(&["SH600000".to_string()], d(2), d(3))
            .unwrap();

        let series = panel.get("SH600000").unwrap();
        assert_eq!(series.dates(), &[d(2), d(3)]);
        assert_eq!(series.close().unwrap(), &[10.5, 11.0]);
        assert_eq!(series.field(Field::Volume).unwrap(), &[1100.0, 1200.0]);
        assert!(!series.has_field(Field::Vwap));
    }

    #[test]
    fn fetch_skips_missing_instruments() {
        let store = write_store(&[("A", "date,close\n2024-01-01,1.0\n")]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let panel = provider
            .fetch(&["A".to_string(), "B".to_string()], d(1), d(31))
            .unwrap();
        assert_eq!(panel.instrument_count(), 1);
        assert!(panel.get("B").is_none());
    }

    #[test]
    fn fetch_skips_instruments_with_no_rows_in_range() {
        let store = write_store(&[("A", "date,close\n2024-01-01,1.0\n")]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let panel = provider.fetch(&["A".to_string()], d(10), d(20)).unwrap();
        assert_eq!(panel.instrument_count(), 0);
    }

    #[test]
    fn empty_cells_become_nan() {
        let store = write_store(&[(
            "A",
            "date,close,vwap\n2024-01-01,1.0,\n2024-01-02,2.0,2.1\n",
        )]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let panel = provider.fetch(&["A".to_string()], d(1), d(2)).unwrap();
        let vwap = panel.get("A").unwrap().field(Field::Vwap).unwrap();
        assert!(vwap[0].is_nan());
        assert_eq!(vwap[1], 2.1);
    }

    #[test]
    fn unsorted_and_duplicate_rows_are_canonicalized() {
        let store = write_store(&[(
            "A",
            "date,close\n2024-01-02,2.0\n2024-01-01,1.0\n2024-01-02,9.9\n",
        )]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let panel = provider.fetch(&["A".to_string()], d(1), d(2)).unwrap();
        let series = panel.get("A").unwrap();
        assert_eq!(series.dates(), &[d(1), d(2)]);
        assert_eq!(series.close().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn missing_date_column_is_malformed() {
        let store = write_store(&[("A", "close\n1.0\n")]);
        let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
        let err = provider.fetch(&["A".to_string()], d(1), d(2)).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }
}
