mod records;
mod topology;

pub use records::{
    distinct_countries, parse_metric_value, read_records, CountrySlice, MetricRecord,
    RecordIndex,
};
pub use topology::{parse_geojson, regions_from_geojson, BBox, GeoRegion, Polygon, Ring};

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read topology {path}: {source}")]
    TopologyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse topology {path}: {source}")]
    TopologyParse {
        path: String,
        #[source]
        source: simd_json::Error,
    },
    #[error("topology {0} contains no named polygon regions")]
    NoRegions(String),
    #[error("failed to read dataset {path}: {source}")]
    DatasetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset {path}: {source}")]
    DatasetParse {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Everything the views need, loaded once and never mutated
#[derive(Debug, Default)]
pub struct Dataset {
    pub regions: Vec<GeoRegion>,
    pub records: Vec<MetricRecord>,
    pub index: RecordIndex,
    /// Distinct dataset countries, first appearance order
    pub countries: Vec<String>,
}

impl Dataset {
    pub fn new(regions: Vec<GeoRegion>, records: Vec<MetricRecord>) -> Self {
        let index = RecordIndex::build(&records);
        let countries = distinct_countries(&records);
        Self {
            regions,
            records,
            index,
            countries,
        }
    }

    /// First record for (country, metric, year), if any
    #[inline]
    pub fn lookup(&self, country: &str, metric: &str, year: &str) -> Option<&MetricRecord> {
        self.index
            .position(country, metric, year)
            .and_then(|idx| self.records.get(idx))
    }
}

/// Load topology and dataset concurrently. Both must succeed.
pub fn load(topology_path: &Path, records_path: &Path) -> Result<Dataset, LoadError> {
    let (regions, records) = rayon::join(
        || load_regions(topology_path),
        || load_records(records_path),
    );
    let regions = regions?;
    let records = records?;

    let dataset = Dataset::new(regions, records);
    info!(
        regions = dataset.regions.len(),
        records = dataset.records.len(),
        countries = dataset.countries.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Load country regions from a GeoJSON file
pub fn load_regions(path: &Path) -> Result<Vec<GeoRegion>, LoadError> {
    let display = path.display().to_string();
    let mut bytes = fs::read(path).map_err(|source| LoadError::TopologyIo {
        path: display.clone(),
        source,
    })?;
    let geojson = parse_geojson(&mut bytes).map_err(|source| LoadError::TopologyParse {
        path: display.clone(),
        source,
    })?;

    let regions = regions_from_geojson(&geojson);
    if regions.is_empty() {
        return Err(LoadError::NoRegions(display));
    }
    Ok(regions)
}

/// Load metric records from a CSV file
pub fn load_records(path: &Path) -> Result<Vec<MetricRecord>, LoadError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| LoadError::DatasetIo {
        path: display.clone(),
        source,
    })?;
    read_records(BufReader::new(file)).map_err(|source| LoadError::DatasetParse {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TOPOLOGY: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "X"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
        {"type": "Feature", "properties": {"name": "United States"},
         "geometry": {"type": "Polygon", "coordinates": [[[-100,30],[-90,30],[-90,40],[-100,40],[-100,30]]]}}
    ]}"#;

    const CSV: &str = "\
Country,Year,Metric,Metric Value
X,2021,GDP,100
United States,2021,GDP,90
X,2020,GDP,95
";

    fn temp_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_joins_both_resources() {
        let topo = temp_with(TOPOLOGY);
        let csv = temp_with(CSV);

        let dataset = load(topo.path(), csv.path()).unwrap();
        assert_eq!(dataset.regions.len(), 2);
        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.countries, vec!["X", "United States"]);
        assert_eq!(dataset.lookup("X", "GDP", "2021").map(|r| r.value), Some(100.0));
        assert!(dataset.lookup("X", "GDP", "2019").is_none());
    }

    #[test]
    fn test_missing_topology_is_fatal() {
        let csv = temp_with(CSV);
        let err = load(Path::new("/nonexistent/world.geojson"), csv.path()).unwrap_err();
        assert!(matches!(err, LoadError::TopologyIo { .. }));
    }

    #[test]
    fn test_missing_dataset_is_fatal() {
        let topo = temp_with(TOPOLOGY);
        let err = load(topo.path(), Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, LoadError::DatasetIo { .. }));
    }

    #[test]
    fn test_topology_without_regions_is_fatal() {
        let topo = temp_with(r#"{"type": "FeatureCollection", "features": []}"#);
        let csv = temp_with(CSV);
        let err = load(topo.path(), csv.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoRegions(_)));
    }

    #[test]
    fn test_malformed_topology_is_fatal() {
        let topo = temp_with("not geojson");
        let csv = temp_with(CSV);
        let err = load(topo.path(), csv.path()).unwrap_err();
        assert!(matches!(err, LoadError::TopologyParse { .. }));
    }

    #[test]
    fn test_malformed_dataset_is_fatal() {
        let topo = temp_with(TOPOLOGY);
        let csv = temp_with("Country,Year,Metric Value\nX,2021,100\n");
        let err = load(topo.path(), csv.path()).unwrap_err();
        assert!(matches!(err, LoadError::DatasetParse { .. }));
    }
}
