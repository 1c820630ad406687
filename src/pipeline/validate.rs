// Engineered-example validation
//
// Checks every JSONL line against a draft 2020-12 schema and collects all
// problems instead of stopping at the first one.

use anyhow::{anyhow, Context, Result};
use jsonschema::{Draft, Validator};
use serde_json::{json, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One problem on one line (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Non-blank lines examined
    pub lines_checked: usize,
    pub issues: Vec<LineIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_valid() {
            "Validation PASS: All lines conform to schema.".to_string()
        } else {
            format!("Validation FAIL: {} issue(s) found.", self.issues.len())
        }
    }
}

/// Schema for one engineered example
pub fn engineered_example_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "tools": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "parameters": {
                            "type": "object",
                            "properties": {
                                "type": {"const": "object"},
                                "properties": {"type": "object"},
                                "required": {"type": "array", "items": {"type": "string"}}
                            },
                            "required": ["type", "properties", "required"]
                        }
                    },
                    "required": ["name", "parameters"]
                }
            },
            "messages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "role": {"type": "string", "enum": ["user", "assistant", "tool"]},
                        "content": {"type": ["string", "null"]},
                        "tool_calls": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "type": {"const": "function"},
                                    "function": {
                                        "type": "object",
                                        "properties": {
                                            "name": {"type": "string"},
                                            "arguments": {"type": "object"}
                                        },
                                        "required": ["name", "arguments"]
                                    }
                                },
                                "required": ["type", "function"]
                            }
                        }
                    },
                    "required": ["role"],
                    "allOf": [
                        {
                            "if": {"properties": {"role": {"const": "assistant"}}},
                            "then": {"anyOf": [{"required": ["content"]}, {"required": ["tool_calls"]}]}
                        },
                        {
                            "if": {"properties": {"role": {"const": "user"}}},
                            "then": {"required": ["content"]}
                        },
                        {
                            "if": {"properties": {"role": {"const": "tool"}}},
                            "then": {"required": ["content"]}
                        }
                    ]
                }
            },
            "label_kind": {"type": "string"}
        },
        "required": ["id", "tools", "messages", "label_kind"]
    })
}

fn compile_validator() -> Result<Validator> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&engineered_example_schema())
        .map_err(|e| anyhow!("Failed to compile engineered-example schema: {}", e))
}

/// Validate JSONL read from `reader`
pub fn validate_lines<R: BufRead>(reader: R) -> Result<ValidationReport> {
    let validator = compile_validator()?;
    let mut report = ValidationReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.lines_checked += 1;

        let instance: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                report.issues.push(LineIssue {
                    line: line_no,
                    message: format!("Invalid JSON: {}", e),
                });
                continue;
            }
        };

        let mut messages: Vec<String> = validator
            .iter_errors(&instance)
            .map(|error| error.to_string())
            .collect();
        messages.sort();
        report
            .issues
            .extend(messages.into_iter().map(|message| LineIssue { line: line_no, message }));
    }

    Ok(report)
}

/// Validate a JSONL file
pub fn validate_jsonl(path: &Path) -> Result<ValidationReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let report = validate_lines(BufReader::new(file))?;
    tracing::info!(
        lines = report.lines_checked,
        issues = report.issues.len(),
        "Validated {}",
        path.display()
    );
    Ok(report)
}
