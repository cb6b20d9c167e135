use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// One (country, metric, year) observation.
///
/// `value` is NaN when the source text was empty or not a number. Such records
/// still occupy their lookup slot but never take part in comparisons or plots.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub country: String,
    pub year: String,
    pub metric: String,
    pub value: f64,
}

impl MetricRecord {
    /// The value if it can be compared or plotted
    #[inline]
    pub fn finite_value(&self) -> Option<f64> {
        self.value.is_finite().then_some(self.value)
    }
}

/// Raw CSV row before the value column is parsed
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Metric")]
    metric: String,
    /// Short rows leave this empty, which parses to NaN
    #[serde(rename = "Metric Value", default)]
    value: String,
}

/// Parse numeric text, yielding NaN instead of an error
pub fn parse_metric_value(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Read metric records from CSV with `Country,Year,Metric,Metric Value` headers.
/// Extra columns are ignored.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<MetricRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize::<RawRow>() {
        let row = row?;
        records.push(MetricRecord {
            value: parse_metric_value(&row.value),
            country: row.country,
            year: row.year,
            metric: row.metric,
        });
    }
    Ok(records)
}

/// Distinct countries in order of first appearance
pub fn distinct_countries(records: &[MetricRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.country.as_str()))
        .map(|r| r.country.clone())
        .collect()
}

/// Countries reported for one (metric, year), mapped to record positions
pub type CountrySlice = HashMap<String, usize>;

/// Direct (metric, year, country) -> record lookup.
///
/// Built in record order with first-insert-wins, so duplicate rows resolve to
/// the same record a front-to-back linear scan would find.
#[derive(Debug, Default)]
pub struct RecordIndex {
    by_metric: HashMap<String, HashMap<String, CountrySlice>>,
}

impl RecordIndex {
    pub fn build(records: &[MetricRecord]) -> Self {
        let mut by_metric: HashMap<String, HashMap<String, CountrySlice>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_metric
                .entry(record.metric.clone())
                .or_default()
                .entry(record.year.clone())
                .or_default()
                .entry(record.country.clone())
                .or_insert(idx);
        }
        Self { by_metric }
    }

    /// All countries for a (metric, year) pair
    #[inline]
    pub fn slice(&self, metric: &str, year: &str) -> Option<&CountrySlice> {
        self.by_metric.get(metric).and_then(|years| years.get(year))
    }

    /// Position of the authoritative record for the triple
    #[inline]
    pub fn position(&self, country: &str, metric: &str, year: &str) -> Option<usize> {
        self.slice(metric, year)
            .and_then(|countries| countries.get(country))
            .copied()
    }
}
