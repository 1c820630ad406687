// Function signature parser
//
// Parses python-style declarations such as
// `def add(x: int, y: int = 1) -> int:` using regex

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches: def <name>(<params>) -> <return type>:
static SIGNATURE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)def\s+([A-Za-z_]\w*)\s*\((.*?)\)\s*->\s*([A-Za-z_][\w\[\]]*)\s*:")
        .expect("Failed to compile signature regex")
});

/// Matches: <name>: <type> [= <default>]
static PARAMETER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\s*:\s*([\w\[\]]+)(?:\s*=\s*([^,]+))?")
        .expect("Failed to compile parameter regex")
});

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: String,
    /// Default value source text, `None` when the parameter has no default
    pub default: Option<String>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A parsed function declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

impl Signature {
    /// Parameter names in declaration order
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

/// Parse the first function declaration found in `text`
///
/// Returns `None` when no declaration matches. Callers treat that as the
/// unparseable case and degrade rather than fail.
pub fn parse_signature(text: &str) -> Option<Signature> {
    let capture = SIGNATURE_REGEX.captures(text)?;

    let name = capture.get(1)?.as_str().to_string();
    let params_str = capture.get(2).map(|m| m.as_str()).unwrap_or_default();
    let return_type = capture.get(3)?.as_str().to_string();

    let parameters = PARAMETER_REGEX
        .captures_iter(params_str)
        .filter_map(|pm| {
            Some(Parameter {
                name: pm.get(1)?.as_str().to_string(),
                type_annotation: pm.get(2)?.as_str().to_string(),
                default: pm.get(3).map(|d| d.as_str().trim().to_string()),
            })
        })
        .collect();

    Some(Signature {
        name,
        return_type,
        parameters,
    })
}
