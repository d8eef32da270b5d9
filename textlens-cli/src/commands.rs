//! CLI subcommand handlers.

use crate::Commands;
use crate::input::{InputArgs, read_source};
use std::path::Path;
use textlens_core::config::{workspace_config_path, write_default_config};
use textlens_core::error::EMPTY_INPUT_MESSAGE;
use textlens_core::{analysis_schema, build_request};

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Prompt { input } => handle_prompt(&input).await,
        Commands::Schema { outline } => handle_schema(outline),
        Commands::Init => handle_init(workspace),
    }
}

async fn handle_prompt(input: &InputArgs) -> anyhow::Result<()> {
    let source = read_source(input).await?;
    if source.trim().is_empty() {
        anyhow::bail!(EMPTY_INPUT_MESSAGE);
    }
    println!("{}", build_request(&source).prompt);
    Ok(())
}

fn handle_schema(outline: bool) -> anyhow::Result<()> {
    let schema = analysis_schema();
    if outline {
        print!("{}", schema.outline());
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&schema.to_response_schema())?
        );
    }
    Ok(())
}

fn handle_init(workspace: &Path) -> anyhow::Result<()> {
    let config_path = workspace_config_path(workspace);
    if config_path.exists() {
        println!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        return Ok(());
    }
    let path = write_default_config(workspace)?;
    println!("Created default configuration at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        handle_init(dir.path()).unwrap();
        let path = workspace_config_path(dir.path());
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("gemini-2.5-flash"));

        std::fs::write(&path, "# edited\n").unwrap();
        handle_init(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
    }

    #[test]
    fn test_prompt_rejects_blank_text() {
        let input = InputArgs {
            text: Some("   ".into()),
            ..Default::default()
        };
        let err = tokio_test::block_on(handle_prompt(&input)).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_INPUT_MESSAGE);
    }
}
