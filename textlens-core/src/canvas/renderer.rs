//! View renderers.
//!
//! Turns a selected [`View`] into terminal text or an HTML fragment, and
//! chart/diagram specs into the configs their external renderers expect.

use super::components::{ChartSpec, DiagramSpec};
use super::view::{RenderedView, View};

/// Render a ChartSpec to a Chart.js config JSON string.
///
/// Gaps serialize as `null`, which Chart.js skips.
pub fn render_chart_config(spec: &ChartSpec) -> String {
    let datasets: Vec<serde_json::Value> = spec
        .datasets
        .iter()
        .map(|ds| {
            let mut obj = serde_json::json!({
                "label": ds.label,
                "data": ds.data,
            });
            if let Some(color) = &ds.color {
                obj["borderColor"] = serde_json::json!(color);
                obj["backgroundColor"] = serde_json::json!(color);
            }
            obj
        })
        .collect();

    let config = serde_json::json!({
        "type": spec.chart_type,
        "data": {
            "labels": spec.labels,
            "datasets": datasets,
        },
        "options": {
            "responsive": true,
            "scales": {
                "y": { "beginAtZero": true }
            },
            "plugins": {
                "legend": { "position": "top" },
                "title": {
                    "display": spec.title.is_some(),
                    "text": spec.title.as_deref().unwrap_or(""),
                }
            }
        }
    });

    serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".into())
}

/// Render a DiagramSpec to Mermaid markup.
pub fn render_diagram_mermaid(spec: &DiagramSpec) -> String {
    let mut output = String::new();
    if let Some(title) = &spec.title {
        output.push_str(&format!("---\ntitle: {}\n---\n", title));
    }
    output.push_str(&spec.source);
    output
}

/// Render a view as plain text for a terminal.
pub fn render_text(view: &View<'_>) -> String {
    let title = view.title();
    let mut out = format!("{}\n{}\n\n", title, "=".repeat(title.chars().count()));

    match &view.body {
        RenderedView::Prose(text) => out.push_str(text),
        RenderedView::OrderedList(items) => {
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, item));
            }
        }
        RenderedView::Definitions(items) => {
            for item in items.iter() {
                out.push_str(&format!("{}\n    {}\n", item.term, item.definition));
            }
        }
        RenderedView::QaCards(items) => {
            let cards: Vec<String> = items
                .iter()
                .map(|qa| format!("Q: {}\nA: {}\n", qa.question, qa.answer))
                .collect();
            out.push_str(&cards.join("\n"));
        }
        RenderedView::Diagram(spec) => out.push_str(&render_diagram_mermaid(spec)),
        RenderedView::DiagramFallback { message } | RenderedView::NoChartData { message } => {
            out.push_str(message)
        }
        RenderedView::BarChart(spec) => out.push_str(&render_chart_table(spec)),
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Render a chart as an aligned text table, one row per category.
fn render_chart_table(spec: &ChartSpec) -> String {
    let mut header = vec!["name".to_string()];
    header.extend(spec.datasets.iter().map(|d| d.label.clone()));

    let rows: Vec<Vec<String>> = spec
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut row = vec![label.clone()];
            row.extend(spec.datasets.iter().map(|d| match d.data.get(i) {
                Some(Some(v)) => format!("{}", v),
                _ => "-".to_string(),
            }));
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            std::iter::once(&header)
                .chain(rows.iter())
                .map(|r| r[c].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |row: &[String]| -> String {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect();
        format!("{}\n", cells.join(" | ").trim_end())
    };

    let mut out = format_row(&header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in &rows {
        out.push_str(&format_row(row));
    }
    out
}

/// Render a view as an HTML fragment.
///
/// Diagrams become a `<pre class="mermaid">` block and charts a `<canvas>`
/// carrying its Chart.js config in `data-chart`.
pub fn render_html(view: &View<'_>) -> String {
    let mut html = format!(
        "<section class=\"view view-{}\">\n<h2>{}</h2>\n",
        view.id,
        escape_html(view.title())
    );

    match &view.body {
        RenderedView::Prose(text) => {
            html.push_str(&format!("<div class=\"prose\">{}</div>\n", escape_html(text)));
        }
        RenderedView::OrderedList(items) => {
            html.push_str("<ol>\n");
            for item in items.iter() {
                html.push_str(&format!("  <li>{}</li>\n", escape_html(item)));
            }
            html.push_str("</ol>\n");
        }
        RenderedView::Definitions(items) => {
            html.push_str("<dl>\n");
            for item in items.iter() {
                html.push_str(&format!(
                    "  <dt>{}</dt>\n  <dd>{}</dd>\n",
                    escape_html(&item.term),
                    escape_html(&item.definition)
                ));
            }
            html.push_str("</dl>\n");
        }
        RenderedView::QaCards(items) => {
            for qa in items.iter() {
                html.push_str(&format!(
                    "<div class=\"qa-card\">\n  <p class=\"question\">{}</p>\n  <p class=\"answer\">{}</p>\n</div>\n",
                    escape_html(&qa.question),
                    escape_html(&qa.answer)
                ));
            }
        }
        RenderedView::Diagram(spec) => {
            html.push_str(&format!(
                "<pre class=\"mermaid\">{}</pre>\n",
                escape_html(&render_diagram_mermaid(spec))
            ));
        }
        RenderedView::DiagramFallback { message } | RenderedView::NoChartData { message } => {
            html.push_str(&format!(
                "<p class=\"notice\">{}</p>\n",
                escape_html(message)
            ));
        }
        RenderedView::BarChart(spec) => {
            html.push_str(&format!(
                "<canvas class=\"chart\" data-chart=\"{}\"></canvas>\n",
                escape_html(&render_chart_config(spec))
            ));
        }
    }

    html.push_str("</section>");
    html
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::components::ChartDataset;
    use crate::canvas::view::{NO_CHART_DATA_MESSAGE, ViewId};
    use crate::types::{GlossaryItem, UserAnswer};

    fn chart() -> ChartSpec {
        ChartSpec::bar(
            vec!["2025".into(), "2030".into()],
            vec![
                ChartDataset {
                    label: "Demand".into(),
                    data: vec![Some(31000.0), Some(38000.0)],
                    color: Some("#0ea5e9".into()),
                },
                ChartDataset {
                    label: "Surplus".into(),
                    data: vec![Some(9000.0), None],
                    color: Some("#6366f1".into()),
                },
            ],
        )
    }

    #[test]
    fn test_render_chart_config_bar() {
        let parsed: serde_json::Value = serde_json::from_str(&render_chart_config(&chart())).unwrap();
        assert_eq!(parsed["type"], "bar");
        assert_eq!(parsed["data"]["labels"], serde_json::json!(["2025", "2030"]));
        assert_eq!(parsed["data"]["datasets"][0]["label"], "Demand");
        assert_eq!(parsed["data"]["datasets"][0]["backgroundColor"], "#0ea5e9");
        assert_eq!(
            parsed["data"]["datasets"][1]["data"],
            serde_json::json!([9000.0, null])
        );
        assert_eq!(parsed["options"]["plugins"]["title"]["display"], false);
    }

    #[test]
    fn test_render_diagram_mermaid() {
        let mut spec = DiagramSpec::new("graph TD; A-->B");
        assert_eq!(render_diagram_mermaid(&spec), "graph TD; A-->B");
        spec.title = Some("Flows".into());
        assert_eq!(
            render_diagram_mermaid(&spec),
            "---\ntitle: Flows\n---\ngraph TD; A-->B"
        );
    }

    #[test]
    fn test_render_text_ordered_list() {
        let items = vec!["First?".to_string(), "Second?".to_string()];
        let view = View {
            id: ViewId::Questions,
            body: RenderedView::OrderedList(&items),
        };
        let text = render_text(&view);
        assert!(text.starts_with("Generated Questions\n===================\n"));
        assert!(text.contains("1. First?\n2. Second?\n"));
    }

    #[test]
    fn test_render_text_glossary_and_answers() {
        let glossary = vec![GlossaryItem {
            term: "PPA".into(),
            definition: "Power Purchase Agreement".into(),
        }];
        let text = render_text(&View {
            id: ViewId::Glossary,
            body: RenderedView::Definitions(&glossary),
        });
        assert!(text.contains("PPA\n    Power Purchase Agreement\n"));

        let answers = vec![
            UserAnswer {
                question: "Q1".into(),
                answer: "A1".into(),
            },
            UserAnswer {
                question: "Q2".into(),
                answer: "A2".into(),
            },
        ];
        let text = render_text(&View {
            id: ViewId::Answers,
            body: RenderedView::QaCards(&answers),
        });
        assert!(text.contains("Q: Q1\nA: A1\n\nQ: Q2\nA: A2\n"));
    }

    #[test]
    fn test_render_text_chart_table_marks_gaps() {
        let text = render_text(&View {
            id: ViewId::Viz,
            body: RenderedView::BarChart(chart()),
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "name | Demand | Surplus");
        assert_eq!(lines[5], "2025 | 31000  | 9000");
        assert_eq!(lines[6], "2030 | 38000  | -");
    }

    #[test]
    fn test_render_text_no_chart_data() {
        let text = render_text(&View {
            id: ViewId::Viz,
            body: RenderedView::NoChartData {
                message: NO_CHART_DATA_MESSAGE,
            },
        });
        assert!(text.ends_with("No chart data available.\n"));
    }

    #[test]
    fn test_render_html_escapes_content() {
        let html = render_html(&View {
            id: ViewId::Refined,
            body: RenderedView::Prose("<b>5 & 6</b>"),
        });
        assert!(html.contains("view-refined"));
        assert!(html.contains("&lt;b&gt;5 &amp; 6&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_render_html_diagram_and_chart() {
        let html = render_html(&View {
            id: ViewId::Flows,
            body: RenderedView::Diagram(DiagramSpec::new("graph LR; A-->B")),
        });
        assert!(html.contains("<pre class=\"mermaid\">graph LR; A--&gt;B</pre>"));

        let html = render_html(&View {
            id: ViewId::Viz,
            body: RenderedView::BarChart(chart()),
        });
        assert!(html.contains("<canvas class=\"chart\" data-chart=\""));
        assert!(html.contains("&quot;type&quot;: &quot;bar&quot;"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
    }
}
