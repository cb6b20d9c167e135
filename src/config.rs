use crate::catalog::MetricYearCatalog;
use crate::selection::DEFAULT_BASELINE;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Terminal world map comparing country metrics against a baseline country",
    after_help = "Inputs: a GeoJSON FeatureCollection of country polygons (--topology) and a CSV \
with Country,Year,Metric,Metric Value columns (--data). Neither ships with the crate; \
the defaults are looked up under ./data relative to the working directory."
)]
pub struct Cli {
    /// GeoJSON world-countries topology
    #[arg(long, default_value = "data/countries.geojson")]
    pub topology: PathBuf,

    /// CSV with Country, Year, Metric, Metric Value columns
    #[arg(long, default_value = "data/clean_data.csv")]
    pub data: PathBuf,

    /// JSON metric catalog replacing the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Initial metric (defaults to the catalog's first metric)
    #[arg(long)]
    pub metric: Option<String>,

    /// Initial baseline country
    #[arg(long, default_value = DEFAULT_BASELINE)]
    pub baseline: String,

    /// Initial year (defaults to the metric's first catalog year)
    #[arg(long)]
    pub year: Option<String>,

    /// Write logs here; the terminal itself is busy drawing the map
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The built-in catalog, or the one named by `--catalog`
    pub fn load_catalog(&self) -> Result<MetricYearCatalog> {
        match &self.catalog {
            Some(path) => MetricYearCatalog::from_json_file(path)
                .with_context(|| format!("loading metric catalog {}", path.display())),
            None => Ok(MetricYearCatalog::default()),
        }
    }
}

/// Install a file-backed tracing subscriber. Without a path, logging stays off.
pub fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
