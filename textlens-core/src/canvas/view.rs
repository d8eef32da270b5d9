//! Rendering selector: which field a view shows and how.
//!
//! Each view is a pure function of exactly one field of the result. Selecting
//! a view never touches the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::components::{ChartDataset, ChartSpec, DiagramSpec};
use crate::types::{AnalysisResult, ChartRow, GlossaryItem, UserAnswer};

/// Shown instead of a diagram when `energyFlows` is not Mermaid graph source.
pub const DIAGRAM_FALLBACK_MESSAGE: &str = "Could not generate flowchart. \
     The AI could not generate a flowchart from the provided text. This feature works best \
     with content describing energy production, demand, and surplus data.";

/// Shown instead of a chart when `chartData` is empty.
pub const NO_CHART_DATA_MESSAGE: &str = "No chart data available.";

/// Leading tokens accepted as renderable Mermaid graph source.
pub const DIAGRAM_KEYWORDS: [&str; 2] = ["graph", "flowchart"];

/// Bar colours, cycled per series.
pub const SERIES_PALETTE: [&str; 5] = ["#0ea5e9", "#6366f1", "#ec4899", "#f97316", "#10b981"];

/// The six views over an analysis result, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewId {
    Refined,
    Questions,
    Glossary,
    Answers,
    Flows,
    Viz,
}

impl ViewId {
    pub const ALL: [ViewId; 6] = [
        ViewId::Refined,
        ViewId::Questions,
        ViewId::Glossary,
        ViewId::Answers,
        ViewId::Flows,
        ViewId::Viz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::Refined => "refined",
            ViewId::Questions => "questions",
            ViewId::Glossary => "glossary",
            ViewId::Answers => "answers",
            ViewId::Flows => "flows",
            ViewId::Viz => "viz",
        }
    }

    /// Heading shown above the view.
    pub fn title(&self) -> &'static str {
        match self {
            ViewId::Refined => "Refined Content",
            ViewId::Questions => "Generated Questions",
            ViewId::Glossary => "Glossary",
            ViewId::Answers => "Answers to Your Questions",
            ViewId::Flows => "Energy Flowcharts",
            ViewId::Viz => "Data Visualization",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewId::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown view '{}', expected one of: {}",
                    s,
                    ViewId::ALL.map(|v| v.as_str()).join(", ")
                )
            })
    }
}

/// What a view renders, borrowing from the result where it can.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedView<'a> {
    /// Preformatted prose block.
    Prose(&'a str),
    /// Ordered list of items.
    OrderedList(&'a [String]),
    /// Term / definition pairs.
    Definitions(&'a [GlossaryItem]),
    /// Question / answer cards.
    QaCards(&'a [UserAnswer]),
    /// Hand `DiagramSpec::source` to the diagram renderer.
    Diagram(DiagramSpec),
    DiagramFallback { message: &'static str },
    /// Hand the chart to the bar-chart renderer.
    BarChart(ChartSpec),
    NoChartData { message: &'static str },
}

/// A selected view: its id plus what to render.
#[derive(Debug, Clone, PartialEq)]
pub struct View<'a> {
    pub id: ViewId,
    pub body: RenderedView<'a>,
}

impl View<'_> {
    pub fn title(&self) -> &'static str {
        self.id.title()
    }
}

/// Select what to render for `id`.
pub fn select_view(result: &AnalysisResult, id: ViewId) -> View<'_> {
    let body = match id {
        ViewId::Refined => RenderedView::Prose(&result.refined_content),
        ViewId::Questions => RenderedView::OrderedList(&result.generated_questions),
        ViewId::Glossary => RenderedView::Definitions(&result.glossary),
        ViewId::Answers => RenderedView::QaCards(&result.user_answers),
        ViewId::Flows => {
            if is_renderable_diagram(&result.energy_flows) {
                RenderedView::Diagram(DiagramSpec::new(&result.energy_flows))
            } else {
                RenderedView::DiagramFallback {
                    message: DIAGRAM_FALLBACK_MESSAGE,
                }
            }
        }
        ViewId::Viz => match bar_chart(&result.chart_data) {
            Some(chart) => RenderedView::BarChart(chart),
            None => RenderedView::NoChartData {
                message: NO_CHART_DATA_MESSAGE,
            },
        },
    };
    View { id, body }
}

/// Whether `source` starts with a recognized Mermaid graph keyword.
pub fn is_renderable_diagram(source: &str) -> bool {
    source
        .split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(';'))
        .is_some_and(|token| DIAGRAM_KEYWORDS.contains(&token))
}

/// Build a bar chart from chart rows.
///
/// Series come from the keys of the first row, in order. A `null` value or a
/// later row missing a series leaves a gap; keys that only appear on later rows are not drawn.
/// Returns `None` when there are no rows.
pub fn bar_chart(rows: &[ChartRow]) -> Option<ChartSpec> {
    let first = rows.first()?;
    let labels = rows.iter().map(|r| r.name.clone()).collect();
    let datasets = first
        .keys()
        .enumerate()
        .map(|(i, key)| ChartDataset {
            label: key.to_string(),
            data: rows.iter().map(|r| r.get(key)).collect(),
            color: Some(SERIES_PALETTE[i % SERIES_PALETTE.len()].to_string()),
        })
        .collect();
    Some(ChartSpec::bar(labels, datasets))
}
