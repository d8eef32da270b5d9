//! Error types for the textlens core.
//!
//! Uses `thiserror` for public API error types. Failures are classified by
//! where they happen: before the request (input, configuration), while
//! talking to the model (transport), or after a response arrived but did not
//! satisfy the analysis contract (response format).

/// Message shown to the user for every transport or response-format failure.
pub const RETRY_MESSAGE: &str = "Failed to get a valid response from the AI. Please try again.";

/// Message shown to the user when the source text is empty.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text to analyze.";

/// Top-level error type for the textlens core library.
#[derive(Debug, thiserror::Error)]
pub enum TextlensError {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from a single request to an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// The model answered, but the payload does not satisfy the analysis contract.
#[derive(Debug, thiserror::Error)]
pub enum ResponseFormatError {
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("response does not match expected format: {}", .violations.join("; "))]
    ShapeMismatch { violations: Vec<String> },
}

/// Errors from a single analysis attempt.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Input rejected: {message}")]
    Input { message: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] LlmError),

    #[error("Response format error: {0}")]
    ResponseFormat(#[from] ResponseFormatError),

    #[error("An analysis is already in progress")]
    Busy,
}

/// Diagnostic classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    Input,
    Transport,
    InvalidJson,
    ShapeMismatch,
    Busy,
}

impl std::fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrorKind::Input => write!(f, "input"),
            AnalysisErrorKind::Transport => write!(f, "transport"),
            AnalysisErrorKind::InvalidJson => write!(f, "invalid_json"),
            AnalysisErrorKind::ShapeMismatch => write!(f, "shape_mismatch"),
            AnalysisErrorKind::Busy => write!(f, "busy"),
        }
    }
}

impl AnalysisError {
    pub(crate) fn empty_input() -> Self {
        AnalysisError::Input {
            message: EMPTY_INPUT_MESSAGE.to_string(),
        }
    }

    /// Internal classification, kept distinct even where the user sees the same text.
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            AnalysisError::Input { .. } => AnalysisErrorKind::Input,
            AnalysisError::Transport(_) => AnalysisErrorKind::Transport,
            AnalysisError::ResponseFormat(ResponseFormatError::InvalidJson { .. }) => {
                AnalysisErrorKind::InvalidJson
            }
            AnalysisError::ResponseFormat(ResponseFormatError::ShapeMismatch { .. }) => {
                AnalysisErrorKind::ShapeMismatch
            }
            AnalysisError::Busy => AnalysisErrorKind::Busy,
        }
    }

    /// The single human-readable message shown at the shell boundary.
    ///
    /// Transport and response-format failures are indistinguishable here.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Input { message } => message.clone(),
            AnalysisError::Transport(_) | AnalysisError::ResponseFormat(_) => {
                RETRY_MESSAGE.to_string()
            }
            AnalysisError::Busy => "An analysis is already running. Please wait.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_llm() {
        let err = TextlensError::Llm(LlmError::ApiRequest {
            message: "connection refused".into(),
        });
        assert_eq!(
            err.to_string(),
            "LLM error: API request failed: connection refused"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = TextlensError::Config(ConfigError::EnvVarMissing {
            var: "API_KEY".into(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Environment variable not set: API_KEY"
        );
    }

    #[test]
    fn test_shape_mismatch_joins_violations() {
        let err = ResponseFormatError::ShapeMismatch {
            violations: vec![
                "$.chartData: missing required field".into(),
                "$.glossary: expected array".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "response does not match expected format: $.chartData: missing required field; $.glossary: expected array"
        );
    }

    #[test]
    fn test_transport_and_format_share_user_message() {
        let transport = AnalysisError::Transport(LlmError::RateLimited {
            retry_after_secs: 30,
        });
        let format = AnalysisError::ResponseFormat(ResponseFormatError::InvalidJson {
            message: "expected value at line 1".into(),
        });
        assert_eq!(transport.user_message(), RETRY_MESSAGE);
        assert_eq!(format.user_message(), RETRY_MESSAGE);
        assert_ne!(transport.kind(), format.kind());
    }

    #[test]
    fn test_input_user_message() {
        let err = AnalysisError::empty_input();
        assert_eq!(err.user_message(), EMPTY_INPUT_MESSAGE);
        assert_eq!(err.kind(), AnalysisErrorKind::Input);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(AnalysisErrorKind::InvalidJson.to_string(), "invalid_json");
        assert_eq!(AnalysisErrorKind::ShapeMismatch.to_string(), "shape_mismatch");
    }
}
