// Tool schema builder
//
// Maps a parsed signature to a JSON Schema tool descriptor in the
// OpenAI function-calling shape

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::signature::{parse_signature, Signature};

/// Captures the inner type of `list[T]`
static LIST_INNER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^list\[([^\]]+)\]").expect("Failed to compile list regex"));

/// Tool descriptor derived from a function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ToolInputSchema,
}

/// JSON Schema for tool input parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Always "object"
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Build the descriptor for a parsed signature
    ///
    /// A parameter is required exactly when it has no default.
    pub fn from_signature(signature: &Signature) -> Self {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &signature.parameters {
            properties.insert(param.name.clone(), json_schema_for_type(&param.type_annotation));
            if param.is_required() {
                required.push(param.name.clone());
            }
        }

        Self {
            name: signature.name.clone(),
            description: format!("Auto-generated tool for function {}", signature.name),
            parameters: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required,
            },
        }
    }

    /// Descriptor used when a signature cannot be parsed
    pub fn unknown() -> Self {
        Self::from_signature(&Signature {
            name: "unknown".to_string(),
            return_type: String::new(),
            parameters: Vec::new(),
        })
    }
}

/// Build a tool descriptor straight from signature text
pub fn build_tool(signature_text: &str) -> ToolSchema {
    match parse_signature(signature_text) {
        Some(signature) => ToolSchema::from_signature(&signature),
        None => ToolSchema::unknown(),
    }
}

/// Map a python type annotation to a JSON Schema fragment
///
/// Unknown annotations map to `string`.
pub fn json_schema_for_type(annotation: &str) -> Value {
    let annotation = annotation.trim();
    let lower = annotation.to_lowercase();

    match lower.as_str() {
        "str" | "string" => json!({"type": "string"}),
        "int" | "integer" => json!({"type": "integer"}),
        "float" | "double" | "number" => json!({"type": "number"}),
        "bool" | "boolean" => json!({"type": "boolean"}),
        _ if lower == "list" || lower.starts_with("list[") => {
            let inner = LIST_INNER_REGEX
                .captures(annotation)
                .and_then(|capture| capture.get(1))
                .map(|m| m.as_str())
                .unwrap_or("string");
            json!({"type": "array", "items": json_schema_for_type(inner)})
        }
        _ if lower == "dict" || lower.starts_with("dict[") => json!({"type": "object"}),
        _ => json!({"type": "string"}),
    }
}
