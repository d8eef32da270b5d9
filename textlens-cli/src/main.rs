//! textlens CLI: analyze a document with a structured-output model and
//! print the resulting views.

mod commands;
mod input;
mod run;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use textlens_core::ViewId;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use input::InputArgs;

/// textlens: refine, question, define, answer, diagram and chart any text
#[derive(Parser, Debug)]
#[command(name = "textlens", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    input: InputArgs,

    /// View to print: refined, questions, glossary, answers, flows, viz
    #[arg(long, conflicts_with = "all")]
    view: Option<ViewId>,

    /// Print every view in order
    #[arg(long)]
    all: bool,

    /// Output format for views
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the whole analysis result as JSON
    #[arg(long, conflicts_with_all = ["view", "all", "chart_config"])]
    json: bool,

    /// Print the Chart.js config of the data visualization
    #[arg(long, conflicts_with_all = ["view", "all"])]
    chart_config: bool,

    /// LLM model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the prompt that would be sent, without calling the model
    Prompt {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the response schema sent to the model
    Schema {
        /// Print the human-readable field outline instead of JSON
        #[arg(long)]
        outline: bool,
    },
    /// Write a default configuration to .textlens/config.toml
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.quiet);

    let workspace = resolve_workspace(&cli.workspace)?;

    if let Some(command) = cli.command {
        return commands::handle_command(command, &workspace).await;
    }

    let mut config = textlens_core::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    for warning in config.llm.validate() {
        tracing::warn!("{}", warning);
    }

    let views = if cli.all {
        ViewId::ALL.to_vec()
    } else {
        vec![cli.view.unwrap_or(config.analysis.default_view)]
    };
    let options = run::OutputOptions {
        views,
        format: cli.format,
        json: cli.json,
        chart_config: cli.chart_config,
    };

    run::run_analysis(&cli.input, config, &options).await
}

/// Human-readable stderr logging plus a JSON log file under the data dir.
fn init_tracing(verbose: u8, quiet: bool) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "textlens", "textlens")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    if std::fs::create_dir_all(&log_dir).is_err() {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "textlens.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    Some(guard)
}

/// Canonicalize the workspace directory, failing when it does not exist.
fn resolve_workspace(path: &Path) -> anyhow::Result<PathBuf> {
    let workspace = path
        .canonicalize()
        .with_context(|| format!("Workspace directory not found: {}", path.display()))?;
    if !workspace.is_dir() {
        anyhow::bail!("Workspace is not a directory: {}", path.display());
    }
    Ok(workspace)
}
