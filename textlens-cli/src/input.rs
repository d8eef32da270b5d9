//! Source text selection: file, stdin, inline text or the bundled sample.

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use textlens_core::error::EMPTY_INPUT_MESSAGE;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Bundled sample document about renewable curtailment.
pub const SAMPLE_TEXT: &str = include_str!("../assets/sample.md");

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// File to analyze, or `-` to read stdin
    pub input: Option<PathBuf>,

    /// Analyze this text instead of a file
    #[arg(long, conflicts_with_all = ["input", "sample"])]
    pub text: Option<String>,

    /// Analyze the bundled sample document
    #[arg(long, conflicts_with = "input")]
    pub sample: bool,
}

/// Resolve the source text named by `args`.
pub async fn read_source(args: &InputArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if args.sample {
        return Ok(SAMPLE_TEXT.to_string());
    }
    match args.input.as_deref() {
        Some(path) if path == Path::new("-") => read_all(tokio::io::stdin())
            .await
            .context("Failed to read stdin"),
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => anyhow::bail!(
            "{} Pass a file, `-` for stdin, --text or --sample.",
            EMPTY_INPUT_MESSAGE
        ),
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await?;
    Ok(buf)
}
