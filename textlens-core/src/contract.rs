//! The analysis contract: one declarative description of the response shape.
//!
//! The same [`SchemaNode`] tree is consumed three ways:
//! - [`SchemaNode::to_response_schema`] renders the Gemini `responseSchema`
//! - [`SchemaNode::outline`] renders the field list embedded in the prompt
//! - [`SchemaNode::validate`] checks a parsed response before it is typed
//!
//! Changing a field here changes all three at once.

use serde_json::{Map, Value};
use std::sync::LazyLock;

/// A node in the response-shape description.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String {
        description: &'static str,
        /// Reject empty or whitespace-only strings.
        non_empty: bool,
    },
    Number {
        description: &'static str,
    },
    Array {
        description: &'static str,
        items: Box<SchemaNode>,
    },
    Object {
        description: &'static str,
        fields: Vec<Field>,
        /// Type of fields not listed in `fields`. `None` ignores them.
        additional: Option<Box<SchemaNode>>,
    },
}

/// A named member of an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub node: SchemaNode,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            node,
            required: true,
        }
    }

    pub fn optional(name: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            node,
            required: false,
        }
    }
}

fn string(description: &'static str) -> SchemaNode {
    SchemaNode::String {
        description,
        non_empty: false,
    }
}

fn non_empty_string(description: &'static str) -> SchemaNode {
    SchemaNode::String {
        description,
        non_empty: true,
    }
}

fn number(description: &'static str) -> SchemaNode {
    SchemaNode::Number { description }
}

fn array(description: &'static str, items: SchemaNode) -> SchemaNode {
    SchemaNode::Array {
        description,
        items: Box::new(items),
    }
}

fn object(description: &'static str, fields: Vec<Field>) -> SchemaNode {
    SchemaNode::Object {
        description,
        fields,
        additional: None,
    }
}

static ANALYSIS_SCHEMA: LazyLock<SchemaNode> = LazyLock::new(|| {
    object(
        "The complete analysis of the source text.",
        vec![
            Field::required(
                "refinedContent",
                non_empty_string(
                    "The refined, improved version of the original text, written in a clear and professional tone.",
                ),
            ),
            Field::required(
                "generatedQuestions",
                array(
                    "A list of 5 insightful questions that can be answered from the provided text, to stimulate discussion.",
                    string("A discussion question."),
                ),
            ),
            Field::required(
                "glossary",
                array(
                    "A list of key terms and their definitions.",
                    object(
                        "A glossary entry.",
                        vec![
                            Field::required("term", string("A key technical term from the text.")),
                            Field::required(
                                "definition",
                                string("A simple, easy-to-understand definition for the term."),
                            ),
                        ],
                    ),
                ),
            ),
            Field::required(
                "userAnswers",
                array(
                    "Answers to the user's specific questions.",
                    object(
                        "A question and its answer.",
                        vec![
                            Field::required(
                                "question",
                                string("The original question asked by the user."),
                            ),
                            Field::required(
                                "answer",
                                string(
                                    "A clear and concise answer to the user's question, based only on the provided text.",
                                ),
                            ),
                        ],
                    ),
                ),
            ),
            Field::required(
                "energyFlows",
                non_empty_string(
                    "Mermaid.js 'graph TD' syntax for two separate flowcharts: one for 2025 and one for 2030. \
                     Visualize the energy flow from 'Renewable Capacity' to 'Demand', splitting into 'Energy Used' \
                     and 'Potential Surplus', with the surplus leading to 'Curtailment'. The entire output for \
                     both charts must be a single string, with each chart clearly titled.",
                ),
            ),
            Field::required(
                "chartData",
                array(
                    "Structured data for a bar chart comparing energy metrics for 2025 and 2030.",
                    SchemaNode::Object {
                        description: "One bar-chart category; every field other than name is a numeric series.",
                        fields: vec![
                            Field::required("name", string("The year, e.g., '2025' or '2030'.")),
                            Field::optional("Demand", number("Global Demand in TWh for that year.")),
                            Field::optional(
                                "Capacity",
                                number("Renewable Capacity in TWh for that year."),
                            ),
                            Field::optional(
                                "Surplus",
                                number("Potential Surplus in TWh for that year."),
                            ),
                        ],
                        additional: Some(Box::new(number("An additional numeric series."))),
                    },
                ),
            ),
        ],
    )
});

/// The contract every analysis response must satisfy.
pub fn analysis_schema() -> &'static SchemaNode {
    &ANALYSIS_SCHEMA
}

impl SchemaNode {
    /// OpenAPI type name as the Gemini API expects it.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::String { .. } => "STRING",
            SchemaNode::Number { .. } => "NUMBER",
            SchemaNode::Array { .. } => "ARRAY",
            SchemaNode::Object { .. } => "OBJECT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SchemaNode::String { description, .. }
            | SchemaNode::Number { description }
            | SchemaNode::Array { description, .. }
            | SchemaNode::Object { description, .. } => *description,
        }
    }

    /// Names of the required fields of an object node, in declaration order.
    pub fn required_keys(&self) -> Vec<&'static str> {
        match self {
            SchemaNode::Object { fields, .. } => fields
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Render as a Gemini `responseSchema` value.
    ///
    /// Only the keys Gemini accepts are emitted: `type`, `description`,
    /// `properties`, `required`, `propertyOrdering`, `items`.
    pub fn to_response_schema(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), Value::from(self.type_name()));
        out.insert("description".into(), Value::from(self.description()));
        match self {
            SchemaNode::String { .. } | SchemaNode::Number { .. } => {}
            SchemaNode::Array { items, .. } => {
                out.insert("items".into(), items.to_response_schema());
            }
            SchemaNode::Object { fields, .. } => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.to_string(), f.node.to_response_schema()))
                    .collect();
                out.insert("properties".into(), Value::Object(properties));
                out.insert(
                    "required".into(),
                    Value::from(self.required_keys()),
                );
                out.insert(
                    "propertyOrdering".into(),
                    Value::from(fields.iter().map(|f| f.name).collect::<Vec<_>>()),
                );
            }
        }
        Value::Object(out)
    }

    /// Human-readable field list for the prompt, one line per field.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let fields = match self {
            SchemaNode::Object { fields, .. } => fields,
            SchemaNode::Array { items, .. } => return items.write_outline(out, depth),
            _ => return,
        };
        let indent = "  ".repeat(depth);
        for field in fields {
            let requirement = if field.required { "required" } else { "optional" };
            out.push_str(&format!(
                "{}- {} ({}, {}): {}\n",
                indent,
                field.name,
                field.node.shape_label(),
                requirement,
                field.node.description()
            ));
            field.node.write_outline(out, depth + 1);
        }
        if let SchemaNode::Object {
            additional: Some(extra),
            ..
        } = self
        {
            out.push_str(&format!(
                "{}- any other key ({}, optional): {}\n",
                indent,
                extra.shape_label(),
                extra.description()
            ));
        }
    }

    fn shape_label(&self) -> String {
        match self {
            SchemaNode::String { non_empty: true, .. } => "non-empty string".into(),
            SchemaNode::String { .. } => "string".into(),
            SchemaNode::Number { .. } => "number".into(),
            SchemaNode::Array { items, .. } => format!("array of {}", items.plural_label()),
            SchemaNode::Object { .. } => "object".into(),
        }
    }

    fn plural_label(&self) -> &'static str {
        match self {
            SchemaNode::String { .. } => "strings",
            SchemaNode::Number { .. } => "numbers",
            SchemaNode::Array { .. } => "arrays",
            SchemaNode::Object { .. } => "objects",
        }
    }

    /// Check `value` against this node.
    ///
    /// Returns every violation found, each prefixed with a JSON path such as
    /// `$.glossary[2].term`. An empty result means the value conforms.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let mut violations = Vec::new();
        self.validate_at("$", value, &mut violations);
        violations
    }

    fn validate_at(&self, path: &str, value: &Value, violations: &mut Vec<String>) {
        match self {
            SchemaNode::String { non_empty, .. } => match value.as_str() {
                Some(s) if *non_empty && s.trim().is_empty() => {
                    violations.push(format!("{}: expected non-empty string", path));
                }
                Some(_) => {}
                None => violations.push(mismatch(path, "string", value)),
            },
            SchemaNode::Number { .. } => {
                if !value.is_number() {
                    violations.push(mismatch(path, "number", value));
                }
            }
            SchemaNode::Array { items, .. } => match value.as_array() {
                Some(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        items.validate_at(&format!("{}[{}]", path, i), element, violations);
                    }
                }
                None => violations.push(mismatch(path, "array", value)),
            },
            SchemaNode::Object {
                fields, additional, ..
            } => {
                let Some(map) = value.as_object() else {
                    violations.push(mismatch(path, "object", value));
                    return;
                };
                for field in fields {
                    let field_path = format!("{}.{}", path, field.name);
                    match map.get(field.name) {
                        None if field.required => {
                            violations.push(format!("{}: missing required field", field_path));
                        }
                        Some(Value::Null) if !field.required => {}
                        None => {}
                        Some(v) => field.node.validate_at(&field_path, v, violations),
                    }
                }
                if let Some(extra) = additional {
                    for (key, v) in map {
                        if v.is_null() || fields.iter().any(|f| f.name == key.as_str()) {
                            continue;
                        }
                        extra.validate_at(&format!("{}.{}", path, key), v, violations);
                    }
                }
            }
        }
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> String {
    format!("{}: expected {}, found {}", path, expected, json_type(found))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
