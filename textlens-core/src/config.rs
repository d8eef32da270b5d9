//! Configuration system for textlens.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/textlens/config.toml` and/or `.textlens/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::canvas::ViewId;
use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Configuration for the LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name. Only "gemini" talks to a real service.
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature. Kept low so the output follows the schema.
    pub temperature: f32,
    /// Optional cap on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,
    /// Whole-request timeout. Unset means the HTTP client default (none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            base_url: None,
            temperature: 0.2,
            max_output_tokens: None,
            request_timeout_secs: None,
            connect_timeout_secs: 10,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(0.0..=2.0).contains(&self.temperature) {
            warnings.push(format!(
                "temperature ({}) is outside the supported range 0.0..=2.0",
                self.temperature
            ));
        } else if self.temperature > 0.5 {
            warnings.push(format!(
                "temperature ({}) is high; responses are less likely to match the analysis schema",
                self.temperature
            ));
        }
        if self.model.trim().is_empty() {
            warnings.push("model is empty".to_string());
        }
        if self.max_output_tokens == Some(0) {
            warnings.push("max_output_tokens is 0; the model cannot answer".to_string());
        }
        if self.request_timeout_secs == Some(0) {
            warnings.push("request_timeout_secs is 0; every request will time out".to_string());
        }
        warnings
    }
}

/// Configuration for how results are presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// View shown after a successful analysis when none is requested.
    pub default_view: ViewId,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_view: ViewId::Refined,
        }
    }
}

/// Resolve the API key named by `config.api_key_env`.
///
/// Absence is a startup failure: callers should stop before building a gateway.
pub fn resolve_api_key(config: &LlmConfig) -> Result<String, ConfigError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::EnvVarMissing {
            var: config.api_key_env.clone(),
        }),
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "textlens", "textlens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".textlens").join("config.toml")
}

/// Load configuration by merging multiple sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `TEXTLENS_`)
/// 3. Workspace-local config (`.textlens/config.toml`)
/// 4. User config (`~/.config/textlens/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&AppConfig>,
) -> Result<AppConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // TEXTLENS_LLM__MODEL, TEXTLENS_ANALYSIS__DEFAULT_VIEW, etc.
    figment = figment.merge(Env::prefixed("TEXTLENS_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Write the default configuration to the workspace config file.
///
/// Refuses to overwrite an existing file. Returns the path written.
pub fn write_default_config(workspace: &Path) -> Result<PathBuf, ConfigError> {
    let path = workspace_config_path(workspace);
    if path.exists() {
        return Err(ConfigError::Invalid {
            message: format!("{} already exists", path.display()),
        });
    }
    let content = toml::to_string_pretty(&AppConfig::default()).map_err(|e| {
        ConfigError::ParseError {
            message: e.to_string(),
        }
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid {
            message: format!("cannot create {}: {}", parent.display(), e),
        })?;
    }
    std::fs::write(&path, content).map_err(|e| ConfigError::Invalid {
        message: format!("cannot write {}: {}", path.display(), e),
    })?;
    Ok(path)
}
