//! Table exporters — CSV, Parquet, and JSON, plus a metadata sidecar.
//!
//! All formats share a flattened row layout: `instrument`, `date`, then
//! the table's value columns. NaN serializes as an empty CSV cell,
//! a Parquet null, or a JSON null — never zero.
//!
//! Writes are atomic (write to `.tmp`, rename into place) and every
//! export produces a `{path}.meta.json` sidecar with row counts, date
//! range, column list, and a blake3 content hash.

use crate::pipeline::{FeatureTable, LabelTable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown format '{other}' (expected csv, parquet, or json)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(String),

    #[error("CSV export error: {0}")]
    Csv(String),

    #[error("parquet export error: {0}")]
    Parquet(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Metadata sidecar written next to every exported file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub rows: usize,
    pub instruments: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub columns: Vec<String>,
    pub format: OutputFormat,
    pub content_hash: String,
    pub created_at: chrono::NaiveDateTime,
}

/// Path of the metadata sidecar for an output file.
pub fn meta_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.meta.json"))
}

// ─── Flattened row layout ───────────────────────────────────────────

#[derive(Debug, Serialize)]
struct FlatRow {
    instrument: String,
    date: NaiveDate,
    values: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct FlatTable {
    columns: Vec<String>,
    rows: Vec<FlatRow>,
}

fn flatten_features(table: &FeatureTable) -> FlatTable {
    let mut rows = Vec::with_capacity(table.row_count());
    for (instrument, block) in &table.instruments {
        for (row, date) in block.dates.iter().enumerate() {
            rows.push(FlatRow {
                instrument: instrument.clone(),
                date: *date,
                values: block.values.iter().map(|col| col[row]).collect(),
            });
        }
    }
    FlatTable {
        columns: table.columns.clone(),
        rows,
    }
}

fn flatten_labels(table: &LabelTable) -> FlatTable {
    let mut rows = Vec::with_capacity(table.row_count());
    for (instrument, block) in &table.instruments {
        for (row, date) in block.dates.iter().enumerate() {
            rows.push(FlatRow {
                instrument: instrument.clone(),
                date: *date,
                values: vec![block.values[row]],
            });
        }
    }
    FlatTable {
        columns: vec!["label".to_string()],
        rows,
    }
}

// ─── Public entry points ────────────────────────────────────────────

/// Export a feature table and write its metadata sidecar.
pub fn export_features(
    table: &FeatureTable,
    path: &Path,
    format: OutputFormat,
) -> Result<DatasetMeta, ExportError> {
    export_flat(&flatten_features(table), path, format)
}

/// Export a label table and write its metadata sidecar.
pub fn export_labels(
    table: &LabelTable,
    path: &Path,
    format: OutputFormat,
) -> Result<DatasetMeta, ExportError> {
    export_flat(&flatten_labels(table), path, format)
}

fn export_flat(
    flat: &FlatTable,
    path: &Path,
    format: OutputFormat,
) -> Result<DatasetMeta, ExportError> {
    match format {
        OutputFormat::Csv => write_atomic(path, &to_csv_bytes(flat)?)?,
        OutputFormat::Json => {
            let bytes = serde_json::to_vec_pretty(flat)
                .map_err(|e| ExportError::Serialization(e.to_string()))?;
            write_atomic(path, &bytes)?;
        }
        OutputFormat::Parquet => write_parquet_atomic(flat, path)?,
    }

    let meta = build_meta(flat, path, format)?;
    let meta_json = serde_json::to_string_pretty(&meta)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    fs::write(meta_path(path), meta_json)
        .map_err(|e| ExportError::Io(format!("write meta sidecar: {e}")))?;

    Ok(meta)
}

fn build_meta(
    flat: &FlatTable,
    path: &Path,
    format: OutputFormat,
) -> Result<DatasetMeta, ExportError> {
    let bytes =
        fs::read(path).map_err(|e| ExportError::Io(format!("read back {}: {e}", path.display())))?;

    let mut instruments: Vec<&str> = flat.rows.iter().map(|r| r.instrument.as_str()).collect();
    instruments.dedup();

    Ok(DatasetMeta {
        rows: flat.rows.len(),
        instruments: instruments.len(),
        start_date: flat.rows.iter().map(|r| r.date).min(),
        end_date: flat.rows.iter().map(|r| r.date).max(),
        columns: flat.columns.clone(),
        format,
        content_hash: blake3::hash(&bytes).to_hex().to_string(),
        created_at: chrono::Local::now().naive_local(),
    })
}

// ─── Writers ────────────────────────────────────────────────────────

fn to_csv_bytes(flat: &FlatTable) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["instrument".to_string(), "date".to_string()];
    header.extend(flat.columns.iter().cloned());
    wtr.write_record(&header)
        .map_err(|e| ExportError::Csv(e.to_string()))?;

    for row in &flat.rows {
        let mut record = vec![row.instrument.clone(), row.date.to_string()];
        for &v in &row.values {
            record.push(if v.is_nan() {
                String::new()
            } else {
                format!("{v}")
            });
        }
        wtr.write_record(&record)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| ExportError::Csv(format!("flush: {e}")))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| ExportError::Io(format!("create output dir: {e}")))?;
        }
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| ExportError::Io(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ExportError::Io(format!("atomic rename failed: {e}"))
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.tmp"))
}

fn write_parquet_atomic(flat: &FlatTable, path: &Path) -> Result<(), ExportError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is valid");

    let instruments: Vec<String> = flat.rows.iter().map(|r| r.instrument.clone()).collect();
    let dates: Vec<i32> = flat
        .rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    let mut columns = vec![
        Column::new("instrument".into(), instruments),
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| ExportError::Parquet(format!("date cast: {e}")))?,
    ];
    for (i, name) in flat.columns.iter().enumerate() {
        let values: Vec<Option<f64>> = flat
            .rows
            .iter()
            .map(|r| {
                let v = r.values[i];
                if v.is_nan() {
                    None
                } else {
                    Some(v)
                }
            })
            .collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    let mut df = DataFrame::new(columns)
        .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| ExportError::Io(format!("create output dir: {e}")))?;
        }
    }

    let tmp = tmp_path(path);
    let file = fs::File::create(&tmp)
        .map_err(|e| ExportError::Io(format!("create {}: {e}", tmp.display())))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| ExportError::Parquet(format!("write parquet: {e}")))?;

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ExportError::Io(format!("atomic rename failed: {e}"))
    })
}
