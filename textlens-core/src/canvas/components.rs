//! Chart and diagram specifications handed to external renderers.

use serde::{Deserialize, Serialize};

/// Chart specification (rendered via Chart.js).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart type: "bar", "line", ...
    pub chart_type: String,
    /// Category labels (x-axis).
    pub labels: Vec<String>,
    /// One dataset per series.
    pub datasets: Vec<ChartDataset>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A single series in a chart.
///
/// `data` is aligned with [`ChartSpec::labels`]; `None` marks a category
/// that has no value for this series and is drawn as a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ChartSpec {
    pub fn bar(labels: Vec<String>, datasets: Vec<ChartDataset>) -> Self {
        Self {
            chart_type: "bar".into(),
            labels,
            datasets,
            title: None,
        }
    }

    /// Series labels in order.
    pub fn series(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.label.as_str()).collect()
    }
}

/// Diagram specification (rendered via Mermaid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSpec {
    /// Mermaid source code, passed to the renderer untouched.
    pub source: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl DiagramSpec {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.into(),
            title: None,
        }
    }
}
