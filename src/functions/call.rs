// Function call parser
//
// Turns generated call text such as `add(1, y=2)` into a function name and
// an argument object keyed by parameter name. Parsing is two-phase: a strict
// literal-evaluation pass, then a permissive comma splitter when the strict
// pass rejects the text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::literal::{parse_call_arguments, LiteralError};

/// Matches: <name>(<args>) spanning the whole text
static CALL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z_]\w*)\s*\((.*)\)\s*$").expect("Failed to compile call regex")
});

/// Function name of a call expression, if `text` has the `name(args)` shape
pub fn call_name(text: &str) -> Option<&str> {
    CALL_REGEX
        .captures(text)
        .and_then(|capture| capture.get(1))
        .map(|m| m.as_str())
}

/// Parse a call expression into `(name, arguments)`
///
/// Positional arguments are keyed by the parameter name at the same
/// position in `param_names`; positionals beyond the list are dropped.
/// Text without the `name(args)` shape yields the trimmed text as the name
/// and no arguments.
pub fn parse_function_call(text: &str, param_names: &[String]) -> (String, Map<String, Value>) {
    let Some(capture) = CALL_REGEX.captures(text) else {
        return (text.trim().to_string(), Map::new());
    };

    let name = capture
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let args_str = capture.get(2).map(|m| m.as_str()).unwrap_or_default();

    let arguments = match parse_literal_arguments(args_str, param_names) {
        Ok(arguments) => arguments,
        Err(e) => {
            tracing::debug!(call = %name, "Literal parse failed ({}), splitting arguments", e);
            parse_split_arguments(args_str, param_names)
        }
    };

    (name, arguments)
}

/// Strict phase: evaluate the argument list as literals
fn parse_literal_arguments(
    args_str: &str,
    param_names: &[String],
) -> Result<Map<String, Value>, LiteralError> {
    let parsed = parse_call_arguments(args_str)?;

    let mut arguments = Map::new();
    for (param, argument) in param_names.iter().zip(parsed.positional) {
        arguments.insert(param.clone(), argument.into_value());
    }
    for (keyword, argument) in parsed.keywords {
        arguments.insert(keyword, argument.into_value());
    }
    Ok(arguments)
}

/// Fallback phase: split on top-level commas and keep values as strings
fn parse_split_arguments(args_str: &str, param_names: &[String]) -> Map<String, Value> {
    let mut arguments = Map::new();
    let mut positional = param_names.iter();

    for part in split_arguments(args_str) {
        if let Some((key, value)) = part.split_once('=') {
            arguments.insert(key.trim().to_string(), Value::String(strip_quotes(value)));
        } else if let Some(param) = positional.next() {
            arguments.insert(param.clone(), Value::String(strip_quotes(&part)));
        }
    }

    arguments
}

fn strip_quotes(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string()
}

/// Split an argument list on commas that are outside quotes and brackets
///
/// A quote closes only when the preceding character is not a backslash.
/// Empty parts are dropped.
pub fn split_arguments(args_str: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut depth: i32 = 0;
    let mut in_str: Option<char> = None;
    let mut prev: Option<char> = None;

    for ch in args_str.chars() {
        match in_str {
            Some(quote) => {
                buf.push(ch);
                if ch == quote && prev != Some('\\') {
                    in_str = None;
                }
            }
            None => match ch {
                '\'' | '"' => {
                    in_str = Some(ch);
                    buf.push(ch);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    buf.push(ch);
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    buf.push(ch);
                }
                ',' if depth == 0 => {
                    parts.push(buf.trim().to_string());
                    buf.clear();
                }
                _ => buf.push(ch),
            },
        }
        prev = Some(ch);
    }

    if !buf.is_empty() {
        parts.push(buf.trim().to_string());
    }

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}
