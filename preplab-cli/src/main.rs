//! PrepLab CLI — training-data preparation commands.
//!
//! Commands:
//! - `prepare` — load instruments from the local store, derive features
//!   and next-day-return labels, and export the aligned tables
//! - `status` — report store location, regions, and instrument sets

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use preplab_core::data::{
    list_sets, resolve_instruments, LocalStoreProvider, MarketDataProvider, Region,
};
use preplab_core::export::{export_features, export_labels, meta_path, OutputFormat};
use preplab_core::pipeline::{prepare_training_data, FeatureWindows, TrainingData};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "preplab",
    about = "PrepLab CLI — training-data preparation for trading pipelines"
)]
struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive features and labels from the local store and export them.
    Prepare {
        /// Local store root directory.
        #[arg(long, default_value = "data")]
        store: PathBuf,

        /// Data region.
        #[arg(long, default_value = "cn")]
        region: Region,

        /// Instrument set name, a single identifier, or a comma list.
        #[arg(long, default_value = "csi300")]
        instruments: String,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Output file for the feature table.
        #[arg(long, default_value = "training_data.csv")]
        output: PathBuf,

        /// Output file format.
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// Skip derived-indicator computation (raw fields only).
        #[arg(long, default_value_t = false)]
        no_features: bool,

        /// Optional separate output file for the label table.
        #[arg(long)]
        labels_output: Option<PathBuf>,

        /// TOML file overriding the feature window lists.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report store location, regions present, and instrument sets.
    Status {
        /// Local store root directory.
        #[arg(long, default_value = "data")]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Prepare {
            store,
            region,
            instruments,
            start,
            end,
            output,
            format,
            no_features,
            labels_output,
            config,
        } => run_prepare(
            store,
            region,
            instruments,
            start,
            end,
            output,
            format,
            no_features,
            labels_output,
            config,
        ),
        Commands::Status { store } => run_status(&store),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_prepare(
    store: PathBuf,
    region: Region,
    instruments: String,
    start: Option<String>,
    end: Option<String>,
    output: PathBuf,
    format: OutputFormat,
    no_features: bool,
    labels_output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let start_date = parse_date_or(start.as_deref(), || {
        chrono::Local::now().date_naive() - chrono::Duration::days(365)
    })?;
    let end_date = parse_date_or(end.as_deref(), || chrono::Local::now().date_naive())?;

    let windows = match &config {
        Some(path) => FeatureWindows::from_file(path)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("load windows config {}", path.display()))?,
        None => FeatureWindows::default(),
    };

    info!("preparing training data: region={region}, instruments={instruments}");

    let provider = LocalStoreProvider::new(&store, region)?;
    let ids = resolve_instruments(&store, region, &instruments)?;
    info!(
        "fetching {} instrument(s) from {start_date} to {end_date}",
        ids.len()
    );

    let panel = provider.fetch(&ids, start_date, end_date)?;
    let data = prepare_training_data(&panel, &windows, !no_features)?;

    let features_meta = export_features(&data.features, &output, format)
        .with_context(|| format!("export features to {}", output.display()))?;
    info!("features written to {}", output.display());

    if let Some(labels_path) = &labels_output {
        export_labels(&data.labels, labels_path, format)
            .with_context(|| format!("export labels to {}", labels_path.display()))?;
        info!("labels written to {}", labels_path.display());
    }

    print_summary(&data, &output, labels_output.as_deref(), &features_meta.columns);
    Ok(())
}

fn parse_date_or(
    value: Option<&str>,
    default: impl FnOnce() -> NaiveDate,
) -> Result<NaiveDate> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
        })
        .transpose()
        .map(|d| d.unwrap_or_else(default))
}

fn run_status(store: &Path) -> Result<()> {
    if !store.is_dir() {
        println!("Store directory does not exist: {}", store.display());
        return Ok(());
    }

    println!("Store: {}", store.display());

    for region in [Region::Cn, Region::Us] {
        let region_dir = store.join(region.dir_name());
        if !region_dir.is_dir() {
            continue;
        }

        let instrument_files = std::fs::read_dir(&region_dir)?
            .flatten()
            .filter(|e| {
                e.path().extension().and_then(|x| x.to_str()) == Some("csv")
            })
            .count();

        println!();
        println!("Region: {region}");
        println!("  Instrument files: {instrument_files}");

        let sets = list_sets(store, region)?;
        if sets.is_empty() {
            println!("  Instrument sets: (none)");
        } else {
            println!("  Instrument sets:");
            for name in sets {
                let set = preplab_core::data::InstrumentSet::load(store, region, &name)?;
                println!("    {:<12} {} instrument(s)", name, set.len());
            }
        }
    }

    Ok(())
}

fn print_summary(
    data: &TrainingData,
    output: &Path,
    labels_output: Option<&Path>,
    columns: &[String],
) {
    println!();
    println!("=== Training Data ===");
    println!("Instruments:    {}", data.features.instruments.len());
    println!("Feature rows:   {}", data.features.row_count());
    println!("Label rows:     {}", data.labels.row_count());
    println!("Columns:        {}", columns.join(", "));
    println!("Features:       {}", output.display());
    println!("Metadata:       {}", meta_path(output).display());
    if let Some(path) = labels_output {
        println!("Labels:         {}", path.display());
    }
    println!();
}
