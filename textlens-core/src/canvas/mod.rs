//! # Canvas
//!
//! The six views over an [`AnalysisResult`](crate::types::AnalysisResult):
//! selecting which field a view shows, and rendering it as terminal text,
//! an HTML fragment, a Chart.js config, or Mermaid markup.

pub mod components;
pub mod renderer;
pub mod view;

pub use components::{ChartDataset, ChartSpec, DiagramSpec};
pub use renderer::{render_chart_config, render_diagram_mermaid, render_html, render_text};
pub use view::{
    DIAGRAM_FALLBACK_MESSAGE, NO_CHART_DATA_MESSAGE, RenderedView, View, ViewId, bar_chart,
    is_renderable_diagram, select_view,
};
