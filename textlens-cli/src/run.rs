//! Single-shot analysis: resolve the key, read the source, analyze once and
//! print the requested output.

use crate::OutputFormat;
use crate::input::{InputArgs, read_source};
use textlens_core::canvas::{NO_CHART_DATA_MESSAGE, bar_chart, render_chart_config, render_html, render_text};
use textlens_core::{AnalysisGateway, AnalysisSession, AppConfig, ViewId};
use tracing::info;

/// What to print once the analysis succeeds.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub views: Vec<ViewId>,
    pub format: OutputFormat,
    pub json: bool,
    pub chart_config: bool,
}

pub async fn run_analysis(
    input: &InputArgs,
    config: AppConfig,
    options: &OutputOptions,
) -> anyhow::Result<()> {
    // A missing key stops here, before any input is read.
    let gateway = AnalysisGateway::from_config(&config.llm).map_err(|e| anyhow::anyhow!("{}", e))?;
    let source = read_source(input).await?;

    info!(
        model = gateway.model_name(),
        chars = source.chars().count(),
        "Analyzing"
    );
    let session = AnalysisSession::new(gateway);
    session
        .analyze(&source)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    print!("{}", render_output(&session, options)?);
    Ok(())
}

/// Render the session's current result according to `options`.
pub fn render_output(session: &AnalysisSession, options: &OutputOptions) -> anyhow::Result<String> {
    let state = session.state();
    let Some(result) = state.result.as_deref() else {
        anyhow::bail!("No analysis result available");
    };

    if options.json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(result)?));
    }
    if options.chart_config {
        return Ok(match bar_chart(&result.chart_data) {
            Some(chart) => format!("{}\n", render_chart_config(&chart)),
            None => format!("{}\n", NO_CHART_DATA_MESSAGE),
        });
    }

    let mut sections = Vec::with_capacity(options.views.len());
    for view_id in &options.views {
        session.select_view(*view_id);
        let state = session.state();
        if let Some(view) = state.current_view() {
            sections.push(match options.format {
                OutputFormat::Text => render_text(&view),
                OutputFormat::Html => format!("{}\n", render_html(&view)),
            });
        }
    }
    Ok(sections.join("\n"))
}
