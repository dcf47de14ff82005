//! The raw panel: instrument → field → daily series.
//!
//! Within one instrument all field series share a single date index.
//! Missing observations are explicit NaN — no forward-fill.

use super::field::Field;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All field series for one instrument, aligned on a shared date index.
///
/// Invariants (enforced at construction):
/// - dates strictly increasing, one observation per trading date
/// - every field vector has the same length as the date index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSeries {
    dates: Vec<NaiveDate>,
    fields: BTreeMap<Field, Vec<f64>>,
}

impl InstrumentSeries {
    /// Build a series from a date index and per-field columns.
    ///
    /// Rows are canonicalized: sorted by date ascending, duplicate dates
    /// dropped keeping the first occurrence. The same permutation is
    /// applied to every field column.
    ///
    /// Panics if any field column length differs from the date index.
    pub fn new(dates: Vec<NaiveDate>, fields: BTreeMap<Field, Vec<f64>>) -> Self {
        for (field, values) in &fields {
            assert_eq!(
                values.len(),
                dates.len(),
                "field {field} has {} values for {} dates",
                values.len(),
                dates.len()
            );
        }

        // Sort indices by date, keep the first occurrence of each date.
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        let mut keep: Vec<usize> = Vec::with_capacity(order.len());
        for &i in &order {
            if keep.last().map(|&j| dates[j]) != Some(dates[i]) {
                keep.push(i);
            }
        }

        let canonical_dates: Vec<NaiveDate> = keep.iter().map(|&i| dates[i]).collect();
        let canonical_fields: BTreeMap<Field, Vec<f64>> = fields
            .into_iter()
            .map(|(field, values)| (field, keep.iter().map(|&i| values[i]).collect()))
            .collect();

        Self {
            dates: canonical_dates,
            fields: canonical_fields,
        }
    }

    /// Number of trading dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The date index, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Series for a field, if present.
    pub fn field(&self, field: Field) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// The close series — required for every derived feature and the label.
    pub fn close(&self) -> Option<&[f64]> {
        self.field(Field::Close)
    }

    /// Fields present in this series, in canonical order.
    pub fn present_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    /// Restrict the series to dates within `[start, end]` inclusive.
    pub fn slice_range(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();

        Self {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            fields: self
                .fields
                .iter()
                .map(|(f, v)| (*f, keep.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }
}

/// Raw dataset across instruments: instrument identifier → aligned series.
///
/// Built fresh per invocation from the provider response; nothing persists
/// between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Panel {
    instruments: BTreeMap<String, InstrumentSeries>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: impl Into<String>, series: InstrumentSeries) {
        self.instruments.insert(instrument.into(), series);
    }

    pub fn get(&self, instrument: &str) -> Option<&InstrumentSeries> {
        self.instruments.get(instrument)
    }

    /// Iterate instruments in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstrumentSeries)> {
        self.instruments.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    /// True when the panel holds no instruments or every instrument has
    /// zero dates.
    pub fn is_empty(&self) -> bool {
        self.instruments.values().all(|s| s.is_empty())
    }

    /// Total observation rows across all instruments.
    pub fn total_rows(&self) -> usize {
        self.instruments.values().map(|s| s.len()).sum()
    }

    /// Union of fields present across all instruments, in canonical order.
    pub fn present_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.instruments.values().any(|s| s.has_field(*f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(dates: Vec<NaiveDate>, closes: Vec<f64>) -> InstrumentSeries {
        let mut fields = BTreeMap::new();
        fields.insert(Field::Close, closes);
        InstrumentSeries::new(dates, fields)
    }

    #[test]
    fn construction_sorts_by_date() {
        let s = series(vec![d(3), d(1), d(2)], vec![30.0, 10.0, 20.0]);
        assert_eq!(s.dates(), &[d(1), d(2), d(3)]);
        assert_eq!(s.close().unwrap(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn construction_dedupes_keeping_first() {
        let s = series(vec![d(1), d(1), d(2)], vec![10.0, 99.0, 20.0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.close().unwrap(), &[10.0, 20.0]);
    }

    #[test]
    #[should_panic(expected = "values for")]
    fn construction_rejects_misaligned_field() {
        series(vec![d(1), d(2)], vec![10.0]);
    }

    #[test]
    fn slice_range_is_inclusive() {
        let s = series(vec![d(1), d(2), d(3), d(4)], vec![1.0, 2.0, 3.0, 4.0]);
        let sliced = s.slice_range(d(2), d(3));
        assert_eq!(sliced.dates(), &[d(2), d(3)]);
        assert_eq!(sliced.close().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn panel_present_fields_is_union() {
        let mut p = Panel::new();
        p.insert("A", series(vec![d(1)], vec![1.0]));

        let mut fields = BTreeMap::new();
        fields.insert(Field::Volume, vec![100.0]);
        p.insert("B", InstrumentSeries::new(vec![d(1)], fields));

        assert_eq!(p.present_fields(), vec![Field::Close, Field::Volume]);
    }

    #[test]
    fn panel_empty_when_all_series_empty() {
        let mut p = Panel::new();
        assert!(p.is_empty());
        p.insert("A", series(vec![], vec![]));
        assert!(p.is_empty());
        p.insert("B", series(vec![d(1)], vec![1.0]));
        assert!(!p.is_empty());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut p = Panel::new();
        p.insert("SH600000", series(vec![d(1), d(2)], vec![10.0, 11.0]));
        let json = serde_json::to_string(&p).unwrap();
        let back: Panel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.instrument_count(), 1);
        assert_eq!(back.get("SH600000").unwrap().len(), 2);
    }
}
