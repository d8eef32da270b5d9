//! # Textlens Core
//!
//! Core library for textlens: turns a block of source text into a structured
//! analysis with one call to a structured-output LLM.
//! Provides the analysis contract, prompt builder, LLM interface (brain),
//! Gemini provider, analysis gateway, session state, views and configuration.

pub mod brain;
pub mod canvas;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{LlmProvider, MockLlmProvider};
pub use canvas::{RenderedView, View, ViewId, select_view};
pub use config::{AppConfig, LlmConfig, load_config, resolve_api_key};
pub use contract::{SchemaNode, analysis_schema};
pub use error::{
    AnalysisError, AnalysisErrorKind, ConfigError, LlmError, ResponseFormatError, TextlensError,
};
pub use gateway::{AnalysisGateway, AnalysisSettings, parse_analysis};
pub use prompt::{AnalysisRequest, build_request};
pub use session::{AnalysisSession, AppState, Phase};
pub use types::{AnalysisResult, ChartRow, CompletionRequest, CompletionResponse, GlossaryItem, UserAnswer};
