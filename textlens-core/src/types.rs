//! Core types: the analysis result and the provider request/response pair.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

/// The structured analysis of one source text.
///
/// Produced whole by a successful gateway call and never patched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub refined_content: String,
    pub generated_questions: Vec<String>,
    pub glossary: Vec<GlossaryItem>,
    pub user_answers: Vec<UserAnswer>,
    /// Mermaid source describing the energy flows.
    pub energy_flows: String,
    pub chart_data: Vec<ChartRow>,
}

impl AnalysisResult {
    /// One-line summary used in logs.
    pub fn summary(&self) -> String {
        format!(
            "{} chars refined, {} questions, {} terms, {} answers, {} chart rows",
            self.refined_content.chars().count(),
            self.generated_questions.len(),
            self.glossary.len(),
            self.user_answers.len(),
            self.chart_data.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryItem {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question: String,
    pub answer: String,
}

/// One bar-chart category: a `name` plus dynamically named numeric series.
///
/// Series keep the order in which they appeared in the response, and numbers
/// keep the representation they arrived with. A `null` value keeps its key
/// and is stored as `None`. Rows in the same result may carry different series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub name: String,
    pub values: Vec<(String, Option<Number>)>,
}

impl ChartRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Builder-style helper for appending a series value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Number>) -> Self {
        self.values.push((key.into(), Some(value.into())));
        self
    }

    /// Append a series key whose value is missing.
    pub fn with_gap(mut self, key: impl Into<String>) -> Self {
        self.values.push((key.into(), None));
        self
    }

    /// The value of `key` as a float, for plotting.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
            .and_then(Number::as_f64)
    }

    /// Series keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("name", &self.name)?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChartRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChartRowVisitor;

        impl<'de> Visitor<'de> for ChartRowVisitor {
            type Value = ChartRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object with a string `name` and numeric series")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ChartRow, A::Error> {
                let mut name: Option<String> = None;
                let mut values = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == "name" {
                        if name.is_some() {
                            return Err(de::Error::duplicate_field("name"));
                        }
                        name = Some(access.next_value()?);
                    } else {
                        let value: Option<Number> = access.next_value()?;
                        values.push((key, value));
                    }
                }
                let name = name.ok_or_else(|| de::Error::missing_field("name"))?;
                Ok(ChartRow { name, values })
            }
        }

        deserializer.deserialize_map(ChartRowVisitor)
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A single-turn request to the LLM.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub model: Option<String>,
    /// MIME type the model should answer with (e.g. `application/json`).
    pub response_mime_type: Option<String>,
    /// Provider-native schema the answer must follow.
    pub response_schema: Option<serde_json::Value>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            temperature: 0.7,
            max_tokens: None,
            model: None,
            response_mime_type: None,
            response_schema: None,
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analysis_result_uses_camel_case() {
        let result = AnalysisResult {
            refined_content: "Text".into(),
            generated_questions: vec![],
            glossary: vec![],
            user_answers: vec![],
            energy_flows: "graph TD; A-->B".into(),
            chart_data: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "refinedContent",
                "generatedQuestions",
                "glossary",
                "userAnswers",
                "energyFlows",
                "chartData"
            ]
        );
    }

    #[test]
    fn test_chart_row_preserves_key_order() {
        let row: ChartRow = serde_json::from_str(
            r#"{"Surplus": 9000, "name": "2025", "Demand": 31000, "Capacity": 40000}"#,
        )
        .unwrap();
        assert_eq!(row.name, "2025");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["Surplus", "Demand", "Capacity"]);
        assert_eq!(row.get("Demand"), Some(31000.0));
        assert_eq!(row.get("Missing"), None);
    }

    #[test]
    fn test_chart_row_serializes_name_first() {
        let row = ChartRow::new("2030").with("Demand", 38000).with_gap("Capacity");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"name":"2030","Demand":38000,"Capacity":null}"#);
    }

    #[test]
    fn test_chart_row_requires_name() {
        let err = serde_json::from_str::<ChartRow>(r#"{"Demand": 1}"#).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_chart_row_rejects_non_numeric_series() {
        assert!(serde_json::from_str::<ChartRow>(r#"{"name": "2025", "Demand": "lots"}"#).is_err());
    }

    #[test]
    fn test_chart_row_null_value_keeps_key_as_gap() {
        let row: ChartRow = serde_json::from_str(
            r#"{"name": "2030", "Demand": null, "Exports": null, "Capacity": 65000}"#,
        )
        .unwrap();
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["Demand", "Exports", "Capacity"]);
        assert_eq!(row.get("Demand"), None);
        assert_eq!(row.get("Exports"), None);
        assert_eq!(row.get("Capacity"), Some(65000.0));
    }

    #[test]
    fn test_chart_row_keeps_number_representation() {
        let input = r#"{"name":"2025","Demand":31000,"Share":0.29,"Big":9007199254740993,"Gap":null}"#;
        let row: ChartRow = serde_json::from_str(input).unwrap();
        assert_eq!(serde_json::to_string(&row).unwrap(), input);
    }

    #[test]
    fn test_summary() {
        let result = AnalysisResult {
            refined_content: "abc".into(),
            generated_questions: vec!["q".into(); 5],
            glossary: vec![],
            user_answers: vec![],
            energy_flows: String::new(),
            chart_data: vec![ChartRow::new("2025")],
        };
        assert_eq!(
            result.summary(),
            "3 chars refined, 5 questions, 0 terms, 0 answers, 1 chart rows"
        );
    }

    #[test]
    fn test_completion_request_default() {
        let req = CompletionRequest::default();
        assert!(req.prompt.is_empty());
        assert!(req.response_schema.is_none());
        assert_eq!(req.temperature, 0.7);
    }
}
