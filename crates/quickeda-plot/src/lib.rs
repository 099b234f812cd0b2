//! quickeda-plot: chart rendering backends
//!
//! [`PlotManager`] implements [`ChartRenderer`] and switches between an SVG
//! backend (plotters) and a JSON chart-spec backend by name.

mod error;
mod json;
mod svg;

pub use error::PlotError;

use quickeda_core::{BarChart, ChartRenderer, ScatterChart, StatsResult};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Output format of a [`PlotManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// SVG document drawn with plotters
    #[default]
    Svg,
    /// JSON spec for an external charting front end
    Json,
}

impl FromStr for Backend {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "svg" => Ok(Backend::Svg),
            "json" => Ok(Backend::Json),
            other => Err(PlotError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Svg => f.write_str("svg"),
            Backend::Json => f.write_str("json"),
        }
    }
}

/// A rendered chart
#[derive(Debug, Clone, PartialEq)]
pub enum ChartHandle {
    Svg(String),
    Json(serde_json::Value),
}

impl ChartHandle {
    pub fn as_svg(&self) -> Option<&str> {
        match self {
            ChartHandle::Svg(doc) => Some(doc),
            ChartHandle::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ChartHandle::Json(spec) => Some(spec),
            ChartHandle::Svg(_) => None,
        }
    }
}

/// Backend switcher for chart rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotManager {
    backend: Backend,
    /// SVG canvas size in pixels
    size: (u32, u32),
}

impl Default for PlotManager {
    fn default() -> Self {
        Self {
            backend: Backend::Svg,
            size: (800, 600),
        }
    }
}

impl PlotManager {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Build a manager from a backend name (`svg` or `json`)
    pub fn from_name(name: &str) -> Result<Self, PlotError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn set_backend(&mut self, name: &str) -> Result<(), PlotError> {
        self.backend = name.parse()?;
        debug!(backend = %self.backend, "plot backend selected");
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl ChartRenderer for PlotManager {
    type Handle = ChartHandle;

    fn scatter(&self, chart: &ScatterChart) -> StatsResult<ChartHandle> {
        let handle = match self.backend {
            Backend::Svg => svg::scatter_svg(chart, self.size).map(ChartHandle::Svg),
            Backend::Json => json::scatter_spec(chart).map(ChartHandle::Json),
        }?;
        Ok(handle)
    }

    fn bar(&self, chart: &BarChart) -> StatsResult<ChartHandle> {
        let handle = match self.backend {
            Backend::Svg => svg::bar_svg(chart, self.size).map(ChartHandle::Svg),
            Backend::Json => json::bar_spec(chart).map(ChartHandle::Json),
        }?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickeda_core::bivariate::{check_heteroscedasticity, group_stats, regression_stats};
    use quickeda_core::{DataAnalyzer, GroupTestOptions, RawTable, StatsError, Value};

    fn numeric_table() -> RawTable {
        let x: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 * v + (v * 0.9).sin()).collect();
        RawTable::from_numeric(vec![("x", x), ("y", y)]).unwrap()
    }

    fn scatter_chart() -> ScatterChart {
        let table = numeric_table();
        let x = table.numeric_column("x").unwrap();
        let y = table.numeric_column("y").unwrap();
        ScatterChart {
            feature: "x".into(),
            label: "y".into(),
            regression: regression_stats(&x, &y).unwrap(),
            heteroscedasticity: check_heteroscedasticity(&table, "x", "y").unwrap(),
            x,
            y,
        }
    }

    fn bar_chart() -> BarChart {
        let keys = ["red", "red", "blue", "blue", "green", "green", "green"];
        let values: [f64; 7] = [1.0, 1.4, 3.0, 3.5, 2.0, 2.2, 2.1];
        let table = RawTable::new(vec![
            ("colour", keys.into_iter().map(Value::from).collect()),
            ("score", values.into_iter().map(Value::from).collect()),
        ])
        .unwrap();
        BarChart {
            feature: "colour".into(),
            label: "score".into(),
            stats: group_stats(&table, "colour", "score", &GroupTestOptions::default()).unwrap(),
        }
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("svg".parse::<Backend>().unwrap(), Backend::Svg);
        assert_eq!("json".parse::<Backend>().unwrap(), Backend::Json);
        assert!(matches!(
            "plotly".parse::<Backend>(),
            Err(PlotError::UnsupportedBackend(_))
        ));
        assert_eq!(Backend::Json.to_string(), "json");
    }

    #[test]
    fn test_set_backend_keeps_previous_on_error() {
        let mut manager = PlotManager::default();
        manager.set_backend("json").unwrap();
        assert!(manager.set_backend("seaborn").is_err());
        assert_eq!(manager.backend(), Backend::Json);
    }

    #[test]
    fn test_svg_scatter() {
        let manager = PlotManager::new(Backend::Svg).with_size(400, 300);
        let handle = manager.scatter(&scatter_chart()).unwrap();
        let doc = handle.as_svg().unwrap();
        assert!(doc.contains("<svg"));
        assert!(doc.contains("y vs x"));
        assert!(handle.as_json().is_none());
    }

    #[test]
    fn test_svg_bar() {
        let manager = PlotManager::default();
        let handle = manager.bar(&bar_chart()).unwrap();
        let doc = handle.as_svg().unwrap();
        assert!(doc.contains("<svg"));
        assert!(doc.contains("<rect"));
    }

    #[test]
    fn test_json_scatter_spec() {
        let manager = PlotManager::from_name("json").unwrap();
        let handle = manager.scatter(&scatter_chart()).unwrap();
        let spec = handle.as_json().unwrap();

        assert_eq!(spec["type"], "scatter");
        assert_eq!(spec["points"].as_array().unwrap().len(), 20);
        assert!((spec["regression"]["slope"].as_f64().unwrap() - 1.5).abs() < 0.1);
        assert_eq!(spec["heteroscedasticity"]["breusch_pagan"]["test"], "BreuschPagan");
    }

    #[test]
    fn test_json_bar_spec() {
        let manager = PlotManager::new(Backend::Json);
        let spec = manager.bar(&bar_chart()).unwrap();
        let spec = spec.as_json().unwrap();

        let bars = spec["bars"].as_array().unwrap();
        let names: Vec<&str> = bars.iter().map(|b| b["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["red", "blue", "green"]);
        assert_eq!(spec["pairwise_tests"].as_array().unwrap().len(), 3);
        assert!((spec["bonferroni_threshold"].as_f64().unwrap() - 0.05 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scatter_is_render_error() {
        let mut chart = scatter_chart();
        chart.x = vec![f64::NAN; 3];
        let result = PlotManager::default().scatter(&chart);
        assert!(matches!(result, Err(StatsError::Render(_))));
    }

    #[test]
    fn test_analyzer_with_plot_manager() {
        let analyzer = DataAnalyzer::new(numeric_table());
        let report = analyzer
            .bivariate_analysis("y", &PlotManager::new(Backend::Json))
            .unwrap();
        assert_eq!(report.charts.len(), 1);
        assert!(report.chart("x").unwrap().as_json().is_some());
    }
}
