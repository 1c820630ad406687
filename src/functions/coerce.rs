// Expected-value coercion
//
// Generated functions carry an <expected> return value as text. The
// declared return type picks one rule from a fixed table; each rule either
// produces a typed JSON value or reports why it could not.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Coercion rule selected by a declared return type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// `list...` / `dict...`: parse as JSON
    Json,
    Integer,
    Float,
    Boolean,
    /// `None`: always null
    Null,
    /// Anything else: trimmed text
    Text,
}

impl ReturnKind {
    pub fn from_annotation(return_type: &str) -> Self {
        let rt = return_type.trim().to_lowercase();
        if rt.contains("list") || rt.contains("dict") {
            return ReturnKind::Json;
        }
        match rt.as_str() {
            "int" => ReturnKind::Integer,
            "float" => ReturnKind::Float,
            "bool" => ReturnKind::Boolean,
            "none" => ReturnKind::Null,
            _ => ReturnKind::Text,
        }
    }
}

/// What to do when the expected text does not fit its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    /// Keep the raw text
    #[default]
    Lenient,
    /// Fail the stage
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("'{text}' is not valid JSON: {reason}")]
    InvalidJson { text: String, reason: String },

    #[error("'{0}' is not an integer")]
    NotInteger(String),

    #[error("'{0}' is not a finite float")]
    NotFloat(String),

    #[error("'{0}' is not a boolean")]
    NotBoolean(String),
}

/// Apply one coercion rule to already-trimmed text
pub fn coerce(kind: ReturnKind, text: &str) -> Result<Value, CoercionError> {
    match kind {
        ReturnKind::Json => serde_json::from_str(text).map_err(|e| CoercionError::InvalidJson {
            text: text.to_string(),
            reason: e.to_string(),
        }),
        ReturnKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CoercionError::NotInteger(text.to_string())),
        ReturnKind::Float => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CoercionError::NotFloat(text.to_string())),
        ReturnKind::Boolean => match text.to_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::NotBoolean(text.to_string())),
        },
        ReturnKind::Null => Ok(Value::Null),
        ReturnKind::Text => Ok(Value::String(text.to_string())),
    }
}

/// Coerce `<expected>` text by the declared return type
///
/// In lenient mode a failed rule yields the trimmed text unchanged.
pub fn coerce_expected(
    expected: &str,
    return_type: &str,
    mode: CoercionMode,
) -> Result<Value, CoercionError> {
    let text = expected.trim();
    match coerce(ReturnKind::from_annotation(return_type), text) {
        Ok(value) => Ok(value),
        Err(e) if mode == CoercionMode::Lenient => {
            tracing::debug!("Keeping expected value as text: {}", e);
            Ok(Value::String(text.to_string()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_return_kind_table() {
        assert_eq!(ReturnKind::from_annotation("list[int]"), ReturnKind::Json);
        assert_eq!(ReturnKind::from_annotation("Dict"), ReturnKind::Json);
        assert_eq!(ReturnKind::from_annotation("int"), ReturnKind::Integer);
        assert_eq!(ReturnKind::from_annotation("float"), ReturnKind::Float);
        assert_eq!(ReturnKind::from_annotation("bool"), ReturnKind::Boolean);
        assert_eq!(ReturnKind::from_annotation("None"), ReturnKind::Null);
        assert_eq!(ReturnKind::from_annotation("str"), ReturnKind::Text);
        assert_eq!(ReturnKind::from_annotation(""), ReturnKind::Text);
    }

    #[test]
    fn test_coerce_successes() {
        let lenient = CoercionMode::Lenient;
        assert_eq!(coerce_expected(" 42 ", "int", lenient), Ok(json!(42)));
        assert_eq!(coerce_expected("2.5", "float", lenient), Ok(json!(2.5)));
        assert_eq!(coerce_expected("True", "bool", lenient), Ok(json!(true)));
        assert_eq!(coerce_expected("anything", "None", lenient), Ok(Value::Null));
        assert_eq!(
            coerce_expected("[1, 2]", "list[int]", lenient),
            Ok(json!([1, 2]))
        );
        assert_eq!(
            coerce_expected("{\"ok\": true}", "dict", lenient),
            Ok(json!({"ok": true}))
        );
        assert_eq!(coerce_expected("  hi  ", "str", lenient), Ok(json!("hi")));
    }

    #[test]
    fn test_lenient_keeps_raw_text() {
        let lenient = CoercionMode::Lenient;
        assert_eq!(coerce_expected("about 3", "int", lenient), Ok(json!("about 3")));
        assert_eq!(coerce_expected("inf", "float", lenient), Ok(json!("inf")));
        assert_eq!(coerce_expected("yes", "bool", lenient), Ok(json!("yes")));
        assert_eq!(
            coerce_expected("['a', 'b']", "list[str]", lenient),
            Ok(json!("['a', 'b']"))
        );
    }

    #[test]
    fn test_strict_reports_reason() {
        let strict = CoercionMode::Strict;
        assert_eq!(
            coerce_expected("about 3", "int", strict),
            Err(CoercionError::NotInteger("about 3".to_string()))
        );
        assert!(matches!(
            coerce_expected("{bad", "dict", strict),
            Err(CoercionError::InvalidJson { .. })
        ));
    }
}
