//! Feature/label pipeline — transforms a raw panel into an aligned
//! (features, labels) pair.
//!
//! The pipeline is a pure, deterministic, synchronous transform: no
//! retries, no shared mutable state. Each instrument is computed
//! independently; outputs are keyed by (instrument, date), never by
//! position.

pub mod table;
pub mod windows;

pub use table::{FeatureBlock, FeatureTable, LabelBlock, LabelTable};
pub use windows::FeatureWindows;

use crate::domain::{Field, Panel};
use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured pipeline errors. Surfaced to the caller synchronously;
/// no partial output is produced on failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("panel has no usable data (zero instruments or zero dates)")]
    InsufficientData,

    #[error("required field '{field}' missing for instrument '{instrument}'")]
    MissingField { instrument: String, field: Field },
}

/// The aligned training dataset: features and labels share the same
/// (instrument, date) index domain row-for-row.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub features: FeatureTable,
    pub labels: LabelTable,
}

/// Build the raw pass-through feature table: the union of panel fields,
/// no derived columns. Instruments missing a field get NaN for it.
pub fn raw_features(panel: &Panel) -> FeatureTable {
    let fields = panel.present_fields();
    let columns: Vec<String> = fields.iter().map(|f| f.column_name().to_string()).collect();

    let mut instruments = BTreeMap::new();
    for (name, series) in panel.iter() {
        let values: Vec<Vec<f64>> = fields
            .iter()
            .map(|f| match series.field(*f) {
                Some(v) => v.to_vec(),
                None => vec![f64::NAN; series.len()],
            })
            .collect();
        instruments.insert(
            name.to_string(),
            FeatureBlock {
                dates: series.dates().to_vec(),
                values,
            },
        );
    }

    FeatureTable {
        columns,
        instruments,
    }
}

/// Compute the full feature table: raw fields passed through, followed by
/// the derived indicators for the configured windows.
///
/// Every derived value at date t uses only observations at or before t;
/// dates lacking the required trailing history get NaN.
pub fn compute_features(
    panel: &Panel,
    windows: &FeatureWindows,
) -> Result<FeatureTable, PipelineError> {
    let mut table = raw_features(panel);
    let indicators = windows.indicators();
    table
        .columns
        .extend(indicators.iter().map(|i| i.name().to_string()));

    for (name, series) in panel.iter() {
        let closes = series.close().ok_or_else(|| PipelineError::MissingField {
            instrument: name.to_string(),
            field: Field::Close,
        })?;

        let block = table
            .instruments
            .get_mut(name)
            .expect("raw_features covers every panel instrument");
        for indicator in &indicators {
            block.values.push(indicator.compute(closes));
        }
    }

    info!(
        "computed features: {} instruments, {} rows, {} columns",
        table.instruments.len(),
        table.row_count(),
        table.columns.len()
    );
    Ok(table)
}

/// Compute next-day-return labels: `label[t] = close[t+1]/close[t] - 1`
/// for every date except each instrument's last.
pub fn compute_labels(panel: &Panel) -> Result<LabelTable, PipelineError> {
    let mut instruments = BTreeMap::new();

    for (name, series) in panel.iter() {
        let closes = series.close().ok_or_else(|| PipelineError::MissingField {
            instrument: name.to_string(),
            field: Field::Close,
        })?;

        let n = series.len();
        let labeled = n.saturating_sub(1);
        let dates: Vec<NaiveDate> = series.dates()[..labeled].to_vec();
        let values: Vec<f64> = (0..labeled)
            .map(|t| {
                let curr = closes[t];
                let next = closes[t + 1];
                if curr.is_nan() || next.is_nan() || curr == 0.0 {
                    f64::NAN
                } else {
                    next / curr - 1.0
                }
            })
            .collect();

        instruments.insert(name.to_string(), LabelBlock { dates, values });
    }

    Ok(LabelTable { instruments })
}

/// Prepare the complete training dataset.
///
/// Composes [`compute_features`] and [`compute_labels`]; when
/// `include_features` is false the feature table is the raw panel
/// pass-through. Each instrument's final feature row (the date with no
/// label) is dropped so the two tables align row-for-row.
pub fn prepare_training_data(
    panel: &Panel,
    windows: &FeatureWindows,
    include_features: bool,
) -> Result<TrainingData, PipelineError> {
    if panel.is_empty() {
        return Err(PipelineError::InsufficientData);
    }

    let labels = compute_labels(panel)?;
    let mut features = if include_features {
        compute_features(panel, windows)?
    } else {
        raw_features(panel)
    };

    // Trim the unlabeled final row per instrument.
    for block in features.instruments.values_mut() {
        let len = block.len();
        block.truncate(len.saturating_sub(1));
    }

    info!(
        "training data prepared: {} feature rows, {} label rows",
        features.row_count(),
        labels.row_count()
    );
    Ok(TrainingData { features, labels })
}
