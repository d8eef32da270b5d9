//! Analysis gateway: one request/response cycle against the model.
//!
//! `analyze` rejects empty input locally, builds the prompt, calls the
//! provider exactly once, then parses and validates the answer against the
//! analysis contract. Validation is all-or-nothing: a partial result is never
//! returned.

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::brain::LlmProvider;
use crate::config::{LlmConfig, resolve_api_key};
use crate::contract::analysis_schema;
use crate::error::{AnalysisError, ResponseFormatError, TextlensError};
use crate::prompt::build_request;
use crate::providers::create_provider;
use crate::types::{AnalysisResult, CompletionRequest};

/// MIME type requested from the model.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Per-request generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Model override; `None` uses the provider's configured model.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: Option<usize>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.2,
            max_output_tokens: None,
        }
    }
}

impl From<&LlmConfig> for AnalysisSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: Some(config.model.clone()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Sends source text to the model and returns a validated [`AnalysisResult`].
///
/// Stateless between calls.
pub struct AnalysisGateway {
    provider: Arc<dyn LlmProvider>,
    settings: AnalysisSettings,
}

impl AnalysisGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: AnalysisSettings) -> Self {
        Self { provider, settings }
    }

    /// Build a gateway for the configured provider.
    ///
    /// Fails with a configuration error when the API key is absent, before
    /// any provider is constructed.
    pub fn from_config(config: &LlmConfig) -> Result<Self, TextlensError> {
        let api_key = resolve_api_key(config)?;
        let provider = create_provider(config, api_key)?;
        Ok(Self::new(provider, AnalysisSettings::from(config)))
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn model_name(&self) -> &str {
        self.settings
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.model_name())
    }

    /// Run one analysis of `source_text`.
    pub async fn analyze(&self, source_text: &str) -> Result<AnalysisResult, AnalysisError> {
        if source_text.trim().is_empty() {
            return Err(AnalysisError::empty_input());
        }

        let attempt_id = uuid::Uuid::new_v4();
        let span = info_span!("analysis", %attempt_id, model = self.model_name());
        let outcome = self.run(source_text).instrument(span.clone()).await;

        span.in_scope(|| match &outcome {
            Ok(result) => info!(summary = %result.summary(), "Analysis completed"),
            Err(e) => warn!(kind = %e.kind(), error = %e, "Analysis failed"),
        });
        outcome
    }

    async fn run(&self, source_text: &str) -> Result<AnalysisResult, AnalysisError> {
        let request = build_request(source_text);
        let completion = CompletionRequest {
            prompt: request.prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
            model: self.settings.model.clone(),
            response_mime_type: Some(JSON_MIME_TYPE.to_string()),
            response_schema: Some(request.schema.to_response_schema()),
        };

        debug!(prompt_chars = completion.prompt.len(), "Requesting analysis");
        let response = self.provider.complete(completion).await?;
        debug!(
            response_chars = response.text.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
            "Received analysis response"
        );

        if response.text.trim().is_empty() {
            return Err(ResponseFormatError::InvalidJson {
                message: match response.finish_reason {
                    Some(reason) => format!("model returned no text (finish reason {})", reason),
                    None => "model returned no text".to_string(),
                },
            }
            .into());
        }
        Ok(parse_analysis(&response.text)?)
    }
}

/// Parse and validate a raw model answer.
///
/// The text is trimmed, parsed as JSON, checked against the analysis
/// contract, and only then converted to the typed result.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ResponseFormatError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| ResponseFormatError::InvalidJson {
            message: e.to_string(),
        })?;

    let violations = analysis_schema().validate(&value);
    if !violations.is_empty() {
        return Err(ResponseFormatError::ShapeMismatch { violations });
    }

    serde_json::from_value(value).map_err(|e| ResponseFormatError::ShapeMismatch {
        violations: vec![format!("$: {}", e)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MockLlmProvider;
    use crate::error::{AnalysisErrorKind, LlmError};
    use crate::types::{ChartRow, GlossaryItem, UserAnswer};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "refinedContent": "Curtailment means switching off renewable output the grid cannot absorb.",
            "generatedQuestions": [
                "What is curtailment?",
                "Why do prices go negative?",
                "What is BESS?",
                "How large is the 2030 surplus?",
                "Who decides technical curtailment?"
            ],
            "glossary": [
                {"term": "TWh", "definition": "Terawatt-hour"},
                {"term": "BESS", "definition": "Battery Energy Storage System"}
            ],
            "userAnswers": [
                {"question": "explain curtailment", "answer": "Throwing away surplus power."},
                {"question": "surplus by 2030", "answer": "About 27,000 TWh."},
                {"question": "interconnected globally", "answer": "The text does not say."}
            ],
            "energyFlows": "graph TD\n  A[Capacity 40000 TWh] --> B[Demand 31000 TWh]",
            "chartData": [
                {"name": "2025", "Demand": 31000, "Capacity": 40000, "Surplus": 9000},
                {"name": "2030", "Demand": 38000, "Capacity": 65000, "Surplus": 27000}
            ]
        })
    }

    fn gateway_with(provider: Arc<MockLlmProvider>) -> AnalysisGateway {
        AnalysisGateway::new(provider, AnalysisSettings::default())
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let provider = Arc::new(MockLlmProvider::new());
        let gateway = gateway_with(provider.clone());

        for input in ["", "   ", "\n\t "] {
            let err = gateway.analyze(input).await.unwrap_err();
            assert_eq!(err.kind(), AnalysisErrorKind::Input);
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_response_format_error() {
        let provider = Arc::new(MockLlmProvider::with_response("Sure! Here is your analysis:"));
        let gateway = gateway_with(provider.clone());

        let err = gateway.analyze("some text").await.unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::InvalidJson);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_chart_data_rejected() {
        let mut value = well_formed();
        value.as_object_mut().unwrap().remove("chartData");
        let provider = Arc::new(MockLlmProvider::with_response(&value.to_string()));

        let err = gateway_with(provider).analyze("text").await.unwrap_err();
        match err {
            AnalysisError::ResponseFormat(ResponseFormatError::ShapeMismatch { violations }) => {
                assert_eq!(violations, vec!["$.chartData: missing required field"]);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_chart_data_accepted() {
        let mut value = well_formed();
        value["chartData"] = json!([]);
        let provider = Arc::new(MockLlmProvider::with_response(&value.to_string()));

        let result = gateway_with(provider).analyze("text").await.unwrap();
        assert!(result.chart_data.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_fidelity() {
        let provider = Arc::new(MockLlmProvider::with_response(&format!(
            "\n  {}  \n",
            well_formed()
        )));
        let result = gateway_with(provider).analyze("text").await.unwrap();

        let expected = AnalysisResult {
            refined_content:
                "Curtailment means switching off renewable output the grid cannot absorb.".into(),
            generated_questions: vec![
                "What is curtailment?".into(),
                "Why do prices go negative?".into(),
                "What is BESS?".into(),
                "How large is the 2030 surplus?".into(),
                "Who decides technical curtailment?".into(),
            ],
            glossary: vec![
                GlossaryItem {
                    term: "TWh".into(),
                    definition: "Terawatt-hour".into(),
                },
                GlossaryItem {
                    term: "BESS".into(),
                    definition: "Battery Energy Storage System".into(),
                },
            ],
            user_answers: vec![
                UserAnswer {
                    question: "explain curtailment".into(),
                    answer: "Throwing away surplus power.".into(),
                },
                UserAnswer {
                    question: "surplus by 2030".into(),
                    answer: "About 27,000 TWh.".into(),
                },
                UserAnswer {
                    question: "interconnected globally".into(),
                    answer: "The text does not say.".into(),
                },
            ],
            energy_flows: "graph TD\n  A[Capacity 40000 TWh] --> B[Demand 31000 TWh]".into(),
            chart_data: vec![
                ChartRow::new("2025")
                    .with("Demand", 31000)
                    .with("Capacity", 40000)
                    .with("Surplus", 9000),
                ChartRow::new("2030")
                    .with("Demand", 38000)
                    .with("Capacity", 65000)
                    .with("Surplus", 27000),
            ],
        };
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_analysis_reserializes_to_the_same_json() {
        let mut value = well_formed();
        value["chartData"] = json!([
            {"name": "2025", "Demand": 31000, "Share": 0.29, "Big": 9007199254740993_u64},
            {"name": "2030", "Demand": null, "Exports": 1200.5}
        ]);
        let result = parse_analysis(&value.to_string()).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), value);
    }

    #[tokio::test]
    async fn test_empty_answer_is_invalid_json() {
        let provider = Arc::new(MockLlmProvider::with_response("  "));
        let err = gateway_with(provider).analyze("text").await.unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::InvalidJson);
        assert!(err.to_string().contains("model returned no text"));
    }

    #[tokio::test]
    async fn test_transport_error_classified() {
        let provider = Arc::new(MockLlmProvider::new());
        provider.queue_error(LlmError::Connection {
            message: "unreachable".into(),
        });

        let err = gateway_with(provider).analyze("text").await.unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::Transport);
        assert_eq!(err.user_message(), crate::error::RETRY_MESSAGE);
    }

    #[tokio::test]
    async fn test_request_carries_schema_and_low_temperature() {
        let provider = Arc::new(MockLlmProvider::with_response(&well_formed().to_string()));
        let gateway = gateway_with(provider.clone());
        gateway.analyze("The source text").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.prompt.contains("The source text"));
        assert_eq!(request.response_mime_type.as_deref(), Some(JSON_MIME_TYPE));
        assert_eq!(request.temperature, 0.2);
        let schema = request.response_schema.as_ref().unwrap();
        assert_eq!(schema["required"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_parse_analysis_rejects_partial_result() {
        let mut value = well_formed();
        value["glossary"] = json!("TWh: terawatt-hour");
        value["userAnswers"] = json!(null);
        match parse_analysis(&value.to_string()) {
            Err(ResponseFormatError::ShapeMismatch { violations }) => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_analysis_rejects_empty_energy_flows() {
        let mut value = well_formed();
        value["energyFlows"] = json!("");
        assert!(matches!(
            parse_analysis(&value.to_string()),
            Err(ResponseFormatError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let config = LlmConfig {
            model: "gemini-2.5-pro".into(),
            temperature: 0.1,
            max_output_tokens: Some(8192),
            ..Default::default()
        };
        let settings = AnalysisSettings::from(&config);
        assert_eq!(settings.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(settings.temperature, 0.1);
        assert_eq!(settings.max_output_tokens, Some(8192));
    }

    #[test]
    fn test_from_config_without_key_is_config_error() {
        let config = LlmConfig {
            api_key_env: "TEXTLENS_GATEWAY_TEST_NO_KEY".into(),
            ..Default::default()
        };
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("TEXTLENS_GATEWAY_TEST_NO_KEY") };
        assert!(matches!(
            AnalysisGateway::from_config(&config),
            Err(TextlensError::Config(_))
        ));
    }
}
