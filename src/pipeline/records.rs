// Stage records
//
// One struct per artifact row. Field names are the on-disk JSON keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::functions::ToolSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("scenario text is empty")]
    EmptyScenario,
}

/// Seed row from the curriculum CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumRow {
    pub domain: String,
    pub subdomain: String,
    #[serde(default)]
    pub entities: String,
}

/// One generated scenario; the text is never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioFields")]
pub struct Scenario {
    pub domain: String,
    pub subdomain: String,
    pub entities: String,
    pub scenario: String,
}

#[derive(Deserialize)]
struct ScenarioFields {
    domain: String,
    subdomain: String,
    #[serde(default)]
    entities: String,
    scenario: String,
}

impl TryFrom<ScenarioFields> for Scenario {
    type Error = RecordError;

    fn try_from(fields: ScenarioFields) -> Result<Self, Self::Error> {
        Scenario::new(
            &CurriculumRow {
                domain: fields.domain,
                subdomain: fields.subdomain,
                entities: fields.entities,
            },
            &fields.scenario,
        )
    }
}

impl Scenario {
    /// Build a scenario for `row`; the text is trimmed and must not be empty
    pub fn new(row: &CurriculumRow, text: &str) -> Result<Self, RecordError> {
        let scenario = text.trim();
        if scenario.is_empty() {
            return Err(RecordError::EmptyScenario);
        }
        Ok(Self {
            domain: row.domain.clone(),
            subdomain: row.subdomain.clone(),
            entities: row.entities.clone(),
            scenario: scenario.to_string(),
        })
    }
}

/// Signature text plus its typed expected return value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub function: String,
    pub expected: Value,
}

/// Functions generated for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionsOutput {
    pub scenario: String,
    pub domain: String,
    pub subdomain: String,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

/// Query paired with the call that answers it
///
/// Parallel queries share this shape; `function_call` then holds the whole
/// multi-call block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleQueryOutput {
    pub user_query: String,
    pub function_call: String,
    pub function_schema: String,
    pub domain: String,
    pub subdomain: String,
}

/// Simple query offered alongside distractor functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleQueryOutput {
    pub user_query: String,
    pub function_call: String,
    /// Correct signature first, then the distractors
    pub function_schemas: Vec<String>,
    pub domain: String,
    pub subdomain: String,
}

impl MultipleQueryOutput {
    pub fn from_simple(query: SimpleQueryOutput, distractors: &[String]) -> Self {
        let mut function_schemas = Vec::with_capacity(distractors.len() + 1);
        function_schemas.push(query.function_schema);
        function_schemas.extend(distractors.iter().cloned());

        Self {
            user_query: query.user_query,
            function_call: query.function_call,
            function_schemas,
            domain: query.domain,
            subdomain: query.subdomain,
        }
    }
}

/// One step of a multi-turn dialogue, stored as a single-key object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEntry {
    Query(String),
    FunctionCall(String),
    Tool(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTurnOutput {
    /// query, function_call, tool, repeated
    pub trace: Vec<TraceEntry>,
    pub function_schemas: Vec<String>,
    pub domain: String,
    pub subdomain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    /// Assistant turn carrying a single tool call
    pub fn assistant_call(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall::function(name, arguments)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(rename = "type")]
    pub call_type: String, // Always "function"
    pub function: ToolCallFunction,
}

impl ToolCall {
    pub fn function(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// One line of the engineered JSONL output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredExample {
    pub id: String,
    pub tools: Vec<ToolSchema>,
    pub messages: Vec<ChatMessage>,
    pub label_kind: String,
}
