//! PrepLab Core — training-data preparation for a quantitative-trading
//! pipeline.
//!
//! This crate contains:
//! - Panel data model (fields, per-instrument series, raw panel)
//! - Derived feature transforms (moving average, momentum, volatility)
//! - Feature/label pipeline with windowed-feature configuration
//! - Market-data provider abstraction with a local-store implementation
//!   and instrument-set resolution
//! - Exporters (CSV, Parquet, JSON) with metadata sidecars

pub mod data;
pub mod domain;
pub mod export;
pub mod features;
pub mod pipeline;
