//! Request builder: turns source text into the analysis prompt.
//!
//! The six tasks and the three fixed questions are part of the contract with
//! downstream views and must keep their order and wording.

use crate::contract::{SchemaNode, analysis_schema};

/// The six analysis tasks, in the order the model is asked to perform them.
pub const TASKS: [(&str, &str); 6] = [
    (
        "Refine Content",
        "Rewrite the text to be clearer, more concise, and well-structured. Correct any grammatical errors. \
         The tone should be informative and professional. Maintain the original language of the text.",
    ),
    (
        "Generate Questions",
        "Create a list of 5 insightful questions that can be answered from the provided text, to stimulate discussion.",
    ),
    (
        "Create Glossary",
        "Identify key technical terms and create a glossary. For each term, provide a simple, \
         easy-to-understand definition in the same language as the text.",
    ),
    (
        "Answer Specific Questions",
        "Provide clear and concise answers to the following specific questions based *only* on the provided text. \
         If the text does not contain enough information to answer a question, state that clearly.",
    ),
    (
        "Generate Energy Flowcharts",
        "Create Mermaid.js graph syntax for two separate flowcharts (one for 2025, one for 2030) that visualize \
         the energy flow from generation to potential surplus and curtailment, based on the data in the text. \
         Use 'graph TD' direction. The syntax for both charts should be in a single string, separated by a \
         newline and each with a title.",
    ),
    (
        "Generate Chart Data",
        "Extract the data for \"Demanda Global\", \"Capacidade Renovável\", and \"Excedente Potencial\" for the \
         years 2025 and 2030. Format this into a JSON array for a bar chart. Example: \
         [{ \"name\": \"2025\", \"Demand\": 31000, \"Capacity\": 40000, \"Surplus\": 9000 }, ...]. \
         Use the numeric values from the text.",
    ),
];

/// Index into [`TASKS`] of the task that carries [`FIXED_QUESTIONS`].
const QUESTIONS_TASK: usize = 3;

/// Questions answered for every input, so answers are comparable across runs.
pub const FIXED_QUESTIONS: [&str; 3] = [
    "explique o curtailment para um idiota (explain curtailment for an idiot).",
    "quanto terremos de excedente energetico renovavel ate 2030 (how much renewable energy surplus will we have by 2030).",
    "quanto podera ser interligado globalmente? (how much can be interconnected globally?).",
];

/// A fully built request: the prompt plus the contract it asks for.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub schema: &'static SchemaNode,
}

/// Build the prompt and schema for `source_text`.
///
/// Pure and deterministic; the caller is expected to reject empty input first.
pub fn build_request(source_text: &str) -> AnalysisRequest {
    let schema = analysis_schema();
    let mut prompt = String::with_capacity(source_text.len() + 4096);

    prompt.push_str(
        "Analyze the following text and perform six tasks. Structure your entire response as a \
         single JSON object matching the provided schema.\n\n",
    );
    prompt.push_str("TEXT TO ANALYZE:\n---\n");
    prompt.push_str(source_text);
    prompt.push_str("\n---\n\nTASKS:\n");

    for (i, (title, instruction)) in TASKS.iter().enumerate() {
        prompt.push_str(&format!("{}. **{}**: {}\n", i + 1, title, instruction));
        if i == QUESTIONS_TASK {
            for (q, question) in FIXED_QUESTIONS.iter().enumerate() {
                prompt.push_str(&format!("    - Question {}: {}\n", q + 1, question));
            }
        }
    }

    prompt.push_str("\nOUTPUT FIELDS:\n");
    prompt.push_str(&schema.outline());

    AnalysisRequest { prompt, schema }
}
