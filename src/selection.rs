use crate::catalog::MetricYearCatalog;
use thiserror::Error;

/// Baseline used when none is given on the command line
pub const DEFAULT_BASELINE: &str = "United States";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown metric {0:?}")]
    UnknownMetric(String),
    #[error("year {year:?} is not cataloged for metric {metric:?}")]
    YearNotInCatalog { metric: String, year: String },
}

/// Current (metric, baseline country, year).
///
/// `year` always belongs to the catalog entry of `metric`. The state never
/// redraws anything; whoever mutates it must refresh the derived views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    metric: String,
    baseline_country: String,
    year: String,
}

impl SelectionState {
    /// First metric, its first year, and the given baseline
    pub fn new(catalog: &MetricYearCatalog, baseline_country: impl Into<String>) -> Self {
        let metric = catalog.first_metric().to_string();
        let year = catalog.first_year(&metric).unwrap_or_default().to_string();
        Self {
            metric,
            baseline_country: baseline_country.into(),
            year,
        }
    }

    /// Start from optional overrides, validated against the catalog
    pub fn with_defaults(
        catalog: &MetricYearCatalog,
        metric: Option<&str>,
        baseline_country: &str,
        year: Option<&str>,
    ) -> Result<Self, SelectionError> {
        let mut state = Self::new(catalog, baseline_country);
        if let Some(metric) = metric {
            state.set_metric(catalog, metric)?;
        }
        if let Some(year) = year {
            state.set_year(catalog, year)?;
        }
        Ok(state)
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn baseline_country(&self) -> &str {
        &self.baseline_country
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    /// Switch metric and reset the year to the metric's first catalog year.
    /// The baseline is left alone.
    pub fn set_metric(
        &mut self,
        catalog: &MetricYearCatalog,
        metric: &str,
    ) -> Result<(), SelectionError> {
        let first_year = catalog
            .first_year(metric)
            .ok_or_else(|| SelectionError::UnknownMetric(metric.to_string()))?;
        self.year = first_year.to_string();
        self.metric = metric.to_string();
        Ok(())
    }

    pub fn set_baseline_country(&mut self, country: &str) {
        self.baseline_country = country.to_string();
    }

    pub fn set_year(&mut self, catalog: &MetricYearCatalog, year: &str) -> Result<(), SelectionError> {
        if !catalog.contains_year(&self.metric, year) {
            return Err(SelectionError::YearNotInCatalog {
                metric: self.metric.clone(),
                year: year.to_string(),
            });
        }
        self.year = year.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_uses_first_metric_and_year() {
        let catalog = MetricYearCatalog::default();
        let state = SelectionState::new(&catalog, DEFAULT_BASELINE);
        assert_eq!(state.metric(), "GDP");
        assert_eq!(state.year(), "2018");
        assert_eq!(state.baseline_country(), "United States");
    }

    #[test]
    fn test_set_metric_resets_year() {
        let catalog = MetricYearCatalog::default();
        let mut state = SelectionState::new(&catalog, DEFAULT_BASELINE);
        state.set_year(&catalog, "2020").unwrap();
        state.set_baseline_country("France");

        state.set_metric(&catalog, "Unemployment (%)").unwrap();
        assert_eq!(state.metric(), "Unemployment (%)");
        assert_eq!(state.year(), "2018");
        assert_eq!(state.baseline_country(), "France");
    }

    #[test]
    fn test_set_metric_unknown_leaves_state() {
        let catalog = MetricYearCatalog::default();
        let mut state = SelectionState::new(&catalog, DEFAULT_BASELINE);
        let before = state.clone();
        let err = state.set_metric(&catalog, "Population").unwrap_err();
        assert_eq!(err, SelectionError::UnknownMetric("Population".into()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_year_outside_catalog() {
        let catalog = MetricYearCatalog::default();
        let mut state = SelectionState::new(&catalog, DEFAULT_BASELINE);
        state.set_metric(&catalog, "Military Spending").unwrap();
        assert!(state.set_year(&catalog, "2018").is_err());
        assert_eq!(state.year(), "2021");
    }

    #[test]
    fn test_set_baseline_only_touches_baseline() {
        let catalog = MetricYearCatalog::default();
        let mut state = SelectionState::new(&catalog, DEFAULT_BASELINE);
        state.set_year(&catalog, "2021").unwrap();
        state.set_baseline_country("Japan");
        assert_eq!(state.metric(), "GDP");
        assert_eq!(state.year(), "2021");
        assert_eq!(state.baseline_country(), "Japan");
    }

    #[test]
    fn test_with_defaults() {
        let catalog = MetricYearCatalog::default();
        let state = SelectionState::with_defaults(
            &catalog,
            Some("Health Expenditure (% GDP)"),
            "Chile",
            Some("2016"),
        )
        .unwrap();
        assert_eq!(state.year(), "2016");

        let err = SelectionState::with_defaults(&catalog, None, "Chile", Some("1999"));
        assert!(err.is_err());
    }

    proptest! {
        #[test]
        fn set_metric_always_resets_year(from in 0usize..6, to in 0usize..6, year_pick in 0usize..8) {
            let catalog = MetricYearCatalog::default();
            let metrics: Vec<String> = catalog.metrics().map(str::to_string).collect();
            let mut state = SelectionState::new(&catalog, DEFAULT_BASELINE);
            state.set_metric(&catalog, &metrics[from]).unwrap();

            let years = catalog.years(&metrics[from]).unwrap().to_vec();
            let year = &years[year_pick % years.len()];
            state.set_year(&catalog, year).unwrap();

            state.set_metric(&catalog, &metrics[to]).unwrap();
            prop_assert_eq!(state.year(), catalog.first_year(&metrics[to]).unwrap());
            prop_assert!(catalog.contains_year(state.metric(), state.year()));
        }
    }
}
