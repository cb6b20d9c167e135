use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Built-in metric table: metric name and the years it is reported for.
const DEFAULT_ENTRIES: &[(&str, &[&str])] = &[
    ("GDP", &["2018", "2019", "2020", "2021"]),
    ("GDP per Capita", &["2018", "2019", "2020", "2021"]),
    (
        "Health Expenditure (% GDP)",
        &["2014", "2015", "2016", "2017", "2018", "2019", "2020"],
    ),
    ("Health Expenditure per Person", &["2018", "2019"]),
    ("Unemployment (%)", &["2018", "2021"]),
    ("Military Spending", &["2021"]),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog has no metrics")]
    Empty,
    #[error("metric {0:?} has no years")]
    NoYears(String),
    #[error("metric {0:?} is listed more than once")]
    DuplicateMetric(String),
}

/// One catalog row as it appears in a JSON catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub metric: String,
    pub years: Vec<String>,
}

/// Metric -> valid years, in declaration order.
///
/// Metric order is the metric selector's option order. Year order is both the
/// year selector's option order and the trend chart's x domain.
#[derive(Debug, Clone)]
pub struct MetricYearCatalog {
    entries: Vec<CatalogEntry>,
}

impl MetricYearCatalog {
    /// Build a catalog, rejecting empty tables, empty year lists and duplicates
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.years.is_empty() {
                return Err(CatalogError::NoYears(entry.metric.clone()));
            }
            if !seen.insert(entry.metric.as_str()) {
                return Err(CatalogError::DuplicateMetric(entry.metric.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Load a catalog from a JSON array of `{"metric": .., "years": [..]}`
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: display,
                source,
            })?;
        Self::new(entries)
    }

    /// Metric names in display order
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.metric.as_str())
    }

    pub fn first_metric(&self) -> &str {
        // Non-empty is checked in `new`
        &self.entries[0].metric
    }

    /// Years for a metric, or `None` if the metric is not cataloged
    pub fn years(&self, metric: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.years.as_slice())
    }

    pub fn first_year(&self, metric: &str) -> Option<&str> {
        self.years(metric)
            .and_then(|years| years.first())
            .map(String::as_str)
    }

    pub fn contains_metric(&self, metric: &str) -> bool {
        self.years(metric).is_some()
    }

    pub fn contains_year(&self, metric: &str, year: &str) -> bool {
        self.years(metric)
            .is_some_and(|years| years.iter().any(|y| y == year))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MetricYearCatalog {
    fn default() -> Self {
        let entries = DEFAULT_ENTRIES
            .iter()
            .map(|(metric, years)| CatalogEntry {
                metric: metric.to_string(),
                years: years.iter().map(|y| y.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }
}
