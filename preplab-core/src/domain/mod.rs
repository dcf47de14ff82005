//! Panel data model — fields, per-instrument series, and the raw panel.

pub mod field;
pub mod panel;

pub use field::Field;
pub use panel::{InstrumentSeries, Panel};
