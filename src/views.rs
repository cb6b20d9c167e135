//! Derived views: everything drawn on screen is computed here from the
//! dataset and the current selection, then replaced wholesale on each refresh.

use crate::catalog::MetricYearCatalog;
use crate::data::Dataset;
use crate::selection::SelectionState;

/// Fill class of a region relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fill {
    /// Strictly greater than the baseline value
    Above,
    /// Less than or equal to the baseline value
    Below,
    /// No comparison possible
    Neutral,
}

impl Fill {
    pub const ALL: [Fill; 3] = [Fill::Neutral, Fill::Below, Fill::Above];

    pub fn label(self) -> &'static str {
        match self {
            Fill::Above => "above baseline",
            Fill::Below => "at/below baseline",
            Fill::Neutral => "no data",
        }
    }
}

/// Compare a region value to the baseline.
///
/// Ties go to `Below`: the test is a strict `>` with no tolerance.
#[inline]
pub fn classify(value: Option<f64>, baseline: Option<f64>) -> Fill {
    match (value, baseline) {
        (Some(v), Some(b)) if v.is_finite() && b.is_finite() => {
            if v > b {
                Fill::Above
            } else {
                Fill::Below
            }
        }
        _ => Fill::Neutral,
    }
}

/// Baseline value for the current selection, `None` if absent or not a number
pub fn baseline_value(dataset: &Dataset, selection: &SelectionState) -> Option<f64> {
    dataset
        .lookup(selection.baseline_country(), selection.metric(), selection.year())
        .and_then(|r| r.finite_value())
}

/// One fill per region, aligned with `dataset.regions`
pub fn choropleth(dataset: &Dataset, selection: &SelectionState) -> Vec<Fill> {
    let Some(baseline) = baseline_value(dataset, selection) else {
        return vec![Fill::Neutral; dataset.regions.len()];
    };

    let slice = dataset.index.slice(selection.metric(), selection.year());
    dataset
        .regions
        .iter()
        .map(|region| {
            let value = slice
                .and_then(|countries| countries.get(&region.name))
                .and_then(|&idx| dataset.records.get(idx))
                .and_then(|r| r.finite_value());
            classify(value, Some(baseline))
        })
        .collect()
}

/// A plotted trend point; `x` is the year's position in the catalog domain
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub x: usize,
    pub year: String,
    pub value: f64,
}

/// Baseline country's values across the metric's catalog years
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    pub country: String,
    pub metric: String,
    /// Catalog years, the discrete x domain
    pub domain: Vec<String>,
    /// Catalog order, at most one per domain year
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest plotted value
    pub fn max_value(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    /// Y axis spans zero to the largest value; degenerate ranges fall back to 1
    pub fn y_bounds(&self) -> [f64; 2] {
        match self.max_value() {
            Some(max) if max > 0.0 => [0.0, max],
            _ => [0.0, 1.0],
        }
    }

    /// X axis in domain index units. A single year is centered.
    pub fn x_bounds(&self) -> [f64; 2] {
        match self.domain.len() {
            0 | 1 => [-1.0, 1.0],
            n => [0.0, (n - 1) as f64],
        }
    }

    /// Axis labels matching `x_bounds`
    pub fn x_labels(&self) -> Vec<String> {
        match self.domain.len() {
            1 => vec![String::new(), self.domain[0].clone(), String::new()],
            _ => self.domain.clone(),
        }
    }

    /// Points as chart coordinates
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        let centered = self.domain.len() == 1;
        self.points
            .iter()
            .map(|p| (if centered { 0.0 } else { p.x as f64 }, p.value))
            .collect()
    }
}

/// Trend of the baseline country for the selected metric.
///
/// Only catalog years are plotted, in catalog order. Years without a record,
/// or whose value is not a number, leave a gap.
pub fn trend(
    dataset: &Dataset,
    catalog: &MetricYearCatalog,
    selection: &SelectionState,
) -> TrendSeries {
    let country = selection.baseline_country();
    let metric = selection.metric();
    let domain = catalog.years(metric).map(<[String]>::to_vec).unwrap_or_default();

    let points = domain
        .iter()
        .enumerate()
        .filter_map(|(x, year)| {
            let value = dataset.lookup(country, metric, year)?.finite_value()?;
            Some(TrendPoint {
                x,
                year: year.clone(),
                value,
            })
        })
        .collect();

    TrendSeries {
        country: country.to_string(),
        metric: metric.to_string(),
        domain,
        points,
    }
}

/// Overlay content for a hovered region
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub country: String,
    pub year: String,
    pub value: Option<f64>,
    pub baseline_country: String,
    pub baseline_value: Option<f64>,
}

impl HoverInfo {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Year: {}", self.year),
            format!("Hovered Country Value: {}", display_value(self.value)),
            format!(
                "Baseline Country ({}) Value: {}",
                self.baseline_country,
                display_value(self.baseline_value)
            ),
        ]
    }
}

/// Look up the hovered region and the baseline independently.
///
/// Returns `None` when neither has a record, in which case no overlay is shown.
pub fn hover(dataset: &Dataset, selection: &SelectionState, region_name: &str) -> Option<HoverInfo> {
    let metric = selection.metric();
    let year = selection.year();
    let hovered = dataset.lookup(region_name, metric, year);
    let baseline = dataset.lookup(selection.baseline_country(), metric, year);

    if hovered.is_none() && baseline.is_none() {
        return None;
    }

    Some(HoverInfo {
        country: region_name.to_string(),
        year: year.to_string(),
        value: hovered.and_then(|r| r.finite_value()),
        baseline_country: selection.baseline_country().to_string(),
        baseline_value: baseline.and_then(|r| r.finite_value()),
    })
}

/// Full value or "N/A"
pub fn display_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => "N/A".to_string(),
    }
}

/// Compact axis label: 21.4T, 65.3K, 3.90
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        return format!("{value:.2}");
    };
    format!("{scaled:.1}{suffix}")
}

/// Both views for one selection
#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    pub fills: Vec<Fill>,
    pub baseline_value: Option<f64>,
    pub trend: TrendSeries,
}

impl DerivedViews {
    pub fn compute(
        dataset: &Dataset,
        catalog: &MetricYearCatalog,
        selection: &SelectionState,
    ) -> Self {
        Self {
            fills: choropleth(dataset, selection),
            baseline_value: baseline_value(dataset, selection),
            trend: trend(dataset, catalog, selection),
        }
    }

    /// Region count per fill class
    pub fn counts(&self) -> [(Fill, usize); 3] {
        Fill::ALL.map(|fill| (fill, self.fills.iter().filter(|&&f| f == fill).count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::data::{GeoRegion, MetricRecord};
    use glam::DVec2;
    use proptest::prelude::*;

    fn record(country: &str, year: &str, metric: &str, value: f64) -> MetricRecord {
        MetricRecord {
            country: country.into(),
            year: year.into(),
            metric: metric.into(),
            value,
        }
    }

    fn region(name: &str) -> GeoRegion {
        let ring = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 0.0),
        ];
        GeoRegion::new(name, vec![vec![ring]])
    }

    fn dataset(records: Vec<MetricRecord>, regions: &[&str]) -> Dataset {
        Dataset::new(regions.iter().map(|n| region(n)).collect(), records)
    }

    fn gdp_2021(catalog: &MetricYearCatalog, baseline: &str) -> SelectionState {
        let mut state = SelectionState::new(catalog, baseline);
        state.set_year(catalog, "2021").unwrap();
        state
    }

    #[test]
    fn test_classify_strict_greater() {
        assert_eq!(classify(Some(100.0), Some(90.0)), Fill::Above);
        assert_eq!(classify(Some(80.0), Some(90.0)), Fill::Below);
        assert_eq!(classify(Some(90.0), Some(90.0)), Fill::Below);
        assert_eq!(classify(Some(0.0), Some(-1.0)), Fill::Above);
        assert_eq!(classify(None, Some(90.0)), Fill::Neutral);
        assert_eq!(classify(Some(f64::NAN), Some(90.0)), Fill::Neutral);
        assert_eq!(classify(Some(100.0), None), Fill::Neutral);
    }

    #[test]
    fn test_region_above_baseline() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("X", "2021", "GDP", 100.0),
                record("United States", "2021", "GDP", 90.0),
            ],
            &["X", "United States"],
        );
        let fills = choropleth(&ds, &gdp_2021(&catalog, "United States"));
        assert_eq!(fills, vec![Fill::Above, Fill::Below]);
    }

    #[test]
    fn test_exact_tie_renders_below() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("Tie", "2021", "GDP", 90.0),
                record("United States", "2021", "GDP", 90.0),
            ],
            &["Tie"],
        );
        let fills = choropleth(&ds, &gdp_2021(&catalog, "United States"));
        assert_eq!(fills, vec![Fill::Below]);
    }

    #[test]
    fn test_missing_baseline_neutralizes_everything() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("X", "2021", "Military Spending", 10.0),
                record("Y", "2021", "Military Spending", 1.0),
                record("United States", "2021", "GDP", 90.0),
            ],
            &["X", "Y", "United States"],
        );
        let mut state = SelectionState::new(&catalog, "United States");
        state.set_metric(&catalog, "Military Spending").unwrap();

        let fills = choropleth(&ds, &state);
        assert!(fills.iter().all(|&f| f == Fill::Neutral));
        assert_eq!(baseline_value(&ds, &state), None);
    }

    #[test]
    fn test_nan_baseline_is_absent() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("X", "2021", "GDP", 100.0),
                record("United States", "2021", "GDP", f64::NAN),
            ],
            &["X"],
        );
        let fills = choropleth(&ds, &gdp_2021(&catalog, "United States"));
        assert_eq!(fills, vec![Fill::Neutral]);
    }

    #[test]
    fn test_unmatched_and_nan_regions_are_neutral() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("United States", "2021", "GDP", 90.0),
                record("Broken", "2021", "GDP", f64::NAN),
                record("United States of America", "2021", "GDP", 95.0),
            ],
            &["Broken", "Nowhere", "United States of America"],
        );
        let fills = choropleth(&ds, &gdp_2021(&catalog, "United States"));
        assert_eq!(fills, vec![Fill::Neutral, Fill::Neutral, Fill::Above]);
    }

    #[test]
    fn test_duplicate_records_first_wins() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("United States", "2021", "GDP", 90.0),
                record("X", "2021", "GDP", 50.0),
                record("X", "2021", "GDP", 500.0),
            ],
            &["X"],
        );
        let fills = choropleth(&ds, &gdp_2021(&catalog, "United States"));
        assert_eq!(fills, vec![Fill::Below]);
    }

    #[test]
    fn test_trend_follows_catalog_order() {
        let catalog = MetricYearCatalog::new(vec![CatalogEntry {
            metric: "GDP".into(),
            years: vec!["2021".into(), "2018".into(), "2019".into()],
        }])
        .unwrap();
        let ds = dataset(
            vec![
                record("US", "2018", "GDP", 1.0),
                record("US", "2019", "GDP", 2.0),
                record("US", "2017", "GDP", 7.0),
                record("US", "2021", "GDP", 4.0),
                record("UK", "2020", "GDP", 9.0),
            ],
            &[],
        );
        let state = SelectionState::new(&catalog, "US");
        let series = trend(&ds, &catalog, &state);

        let years: Vec<&str> = series.points.iter().map(|p| p.year.as_str()).collect();
        assert_eq!(years, vec!["2021", "2018", "2019"]);
        assert_eq!(series.coordinates(), vec![(0.0, 4.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(series.y_bounds(), [0.0, 4.0]);
    }

    #[test]
    fn test_trend_skips_gaps_and_nan() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(
            vec![
                record("US", "2014", "Health Expenditure (% GDP)", 16.0),
                record("US", "2016", "Health Expenditure (% GDP)", f64::NAN),
                record("US", "2020", "Health Expenditure (% GDP)", 18.0),
            ],
            &[],
        );
        let mut state = SelectionState::new(&catalog, "US");
        state.set_metric(&catalog, "Health Expenditure (% GDP)").unwrap();

        let series = trend(&ds, &catalog, &state);
        assert_eq!(series.domain.len(), 7);
        let xs: Vec<usize> = series.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 6]);
    }

    #[test]
    fn test_empty_trend_has_usable_axes() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(Vec::new(), &[]);
        let state = SelectionState::new(&catalog, "Atlantis");
        let series = trend(&ds, &catalog, &state);
        assert!(series.is_empty());
        assert_eq!(series.y_bounds(), [0.0, 1.0]);
        assert_eq!(series.x_bounds(), [0.0, 3.0]);
    }

    #[test]
    fn test_single_year_domain_is_centered() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(vec![record("US", "2021", "Military Spending", 800.0)], &[]);
        let mut state = SelectionState::new(&catalog, "US");
        state.set_metric(&catalog, "Military Spending").unwrap();

        let series = trend(&ds, &catalog, &state);
        assert_eq!(series.x_bounds(), [-1.0, 1.0]);
        assert_eq!(series.x_labels(), vec!["", "2021", ""]);
        assert_eq!(series.coordinates(), vec![(0.0, 800.0)]);
    }

    #[test]
    fn test_hover_independent_lookups() {
        let catalog = MetricYearCatalog::default();
        let ds = dataset(vec![record("United States", "2021", "GDP", 90.0)], &["X"]);
        let state = gdp_2021(&catalog, "United States");

        let info = hover(&ds, &state, "X").unwrap();
        assert_eq!(info.value, None);
        assert_eq!(info.baseline_value, Some(90.0));
        assert_eq!(info.lines()[1], "Hovered Country Value: N/A");
        assert_eq!(info.lines()[2], "Baseline Country (United States) Value: 90");

        let mut other = state.clone();
        other.set_baseline_country("Nobody");
        assert!(hover(&ds, &other, "X").is_none());
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(21_400_000_000_000.0), "21.4T");
        assert_eq!(format_compact(65_300.0), "65.3K");
        assert_eq!(format_compact(3.9), "3.90");
    }

    #[test]
    fn test_counts() {
        let views = DerivedViews {
            fills: vec![Fill::Above, Fill::Neutral, Fill::Above],
            ..Default::default()
        };
        assert_eq!(
            views.counts(),
            [(Fill::Neutral, 1), (Fill::Below, 0), (Fill::Above, 2)]
        );
    }

    proptest! {
        #[test]
        fn trend_never_exceeds_catalog(
            rows in prop::collection::vec((0usize..10, 0.0f64..1e6), 0..40),
            metric_pick in 0usize..6,
        ) {
            let catalog = MetricYearCatalog::default();
            let metric = catalog.metrics().nth(metric_pick).unwrap().to_string();
            let records = rows
                .iter()
                .map(|&(y, v)| record("US", &(2012 + y).to_string(), &metric, v))
                .collect();
            let ds = dataset(records, &[]);
            let mut state = SelectionState::new(&catalog, "US");
            state.set_metric(&catalog, &metric).unwrap();

            let series = trend(&ds, &catalog, &state);
            let domain = catalog.years(&metric).unwrap();
            prop_assert!(series.points.len() <= domain.len());
            prop_assert!(series.points.windows(2).all(|w| w[0].x < w[1].x));
            for p in &series.points {
                prop_assert_eq!(&domain[p.x], &p.year);
            }
        }
    }
}
