//! Store-to-export integration: a temp local store feeds the provider,
//! the pipeline derives features and labels, and both tables land on
//! disk with their sidecars.

use chrono::NaiveDate;
use preplab_core::data::{resolve_instruments, LocalStoreProvider, MarketDataProvider, Region};
use preplab_core::export::{export_features, export_labels, meta_path, OutputFormat};
use preplab_core::pipeline::{prepare_training_data, FeatureWindows};
use std::fs;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn seed_store() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let cn = dir.path().join("cn");
    fs::create_dir_all(cn.join("instruments")).unwrap();

    let mut csv = String::from("date,open,close,volume\n");
    for day in 1..=9 {
        let close = 10.0 + day as f64;
        csv.push_str(&format!(
            "2024-01-{day:02},{},{close},{}\n",
            close - 0.5,
            1000 + day * 10
        ));
    }
    fs::write(cn.join("SH600000.csv"), &csv).unwrap();
    fs::write(cn.join("instruments/demo.txt"), "SH600000\nSH999999\n").unwrap();

    dir
}

#[test]
fn store_to_training_files() {
    let store = seed_store();
    let out = tempfile::tempdir().unwrap();

    let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();
    let instruments = resolve_instruments(store.path(), Region::Cn, "demo").unwrap();
    assert_eq!(instruments.len(), 2);

    // SH999999 has no data file; the panel carries only SH600000.
    let panel = provider.fetch(&instruments, d(1), d(31)).unwrap();
    assert_eq!(panel.instrument_count(), 1);

    let windows = FeatureWindows {
        moving_average: vec![3],
        momentum: vec![2],
        volatility: vec![3],
    };
    let data = prepare_training_data(&panel, &windows, true).unwrap();

    // Nine store rows, final row unlabeled and trimmed.
    assert_eq!(data.features.row_count(), 8);
    assert_eq!(data.labels.row_count(), 8);

    // MA3 at the third date: mean(11,12,13) = 12.
    let ma3 = data.features.get("SH600000", d(3), "MA3").unwrap();
    assert!((ma3 - 12.0).abs() < 1e-12);

    let features_path = out.path().join("training_data.csv");
    let labels_path = out.path().join("labels.csv");
    let fmeta = export_features(&data.features, &features_path, OutputFormat::Csv).unwrap();
    let lmeta = export_labels(&data.labels, &labels_path, OutputFormat::Csv).unwrap();

    assert_eq!(fmeta.rows, 8);
    assert_eq!(lmeta.rows, 8);
    assert!(features_path.exists());
    assert!(labels_path.exists());
    assert!(meta_path(&features_path).exists());

    let header = fs::read_to_string(&features_path)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    assert_eq!(
        header,
        "instrument,date,$open,$close,$volume,MA3,momentum_2,volatility_3"
    );
}

#[test]
fn date_range_narrows_the_panel() {
    let store = seed_store();
    let provider = LocalStoreProvider::new(store.path(), Region::Cn).unwrap();

    let panel = provider
        .fetch(&["SH600000".to_string()], d(3), d(5))
        .unwrap();
    let series = panel.get("SH600000").unwrap();
    assert_eq!(series.dates(), &[d(3), d(4), d(5)]);
}
