// User-friendly error messages
//
// Helpers that turn the common operator mistakes (missing key, missing
// artifact from an earlier stage, broken config) into actionable text.

use std::fmt;
use std::path::Path;

/// Format a missing API key error
pub fn api_key_missing_error() -> String {
    "OPENAI_API_KEY is not set\n\n\
    \x1b[1;32mTry:\x1b[0m\n\
    1. Export it for this shell:\n\
       \x1b[36mexport OPENAI_API_KEY=\"sk-...\"\x1b[0m\n\n\
    2. Or add it to a .env file in the working directory\n\n\
    3. Or set completion.api_key in callsmith.toml"
        .to_string()
}

/// Format an error for an artifact an earlier stage should have written
pub fn missing_artifact_error(path: &Path, description: &str, produced_by: &str) -> String {
    format!(
        "{} not found: {}\n\n\
        \x1b[1;33mPossible causes:\x1b[0m\n\
        • The '{}' stage has not run for this run id\n\
        • The run id file points at a different run\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Run the producing stage:\n\
           \x1b[36mcallsmith {}\x1b[0m\n\n\
        2. Check the run directory:\n\
           \x1b[36mls -la {}\x1b[0m",
        description,
        path.display(),
        produced_by,
        produced_by,
        path.parent().unwrap_or(path).display()
    )
}

/// Format an error for a missing run id
pub fn run_id_missing_error(run_id_file: &Path) -> String {
    format!(
        "No run id found in {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Start a new run with the first stage:\n\
           \x1b[36mcallsmith scenarios\x1b[0m\n\n\
        2. Or run the whole pipeline:\n\
           \x1b[36mcallsmith run\x1b[0m",
        run_id_file.display()
    )
}

/// Format a config parse error with helpful suggestions
pub fn config_parse_error(path: &Path, error: impl fmt::Display) -> String {
    format!(
        "Failed to parse config file {}\n\n\
        \x1b[1;33mError:\x1b[0m {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check config file syntax:\n\
           \x1b[36mcat {}\x1b[0m\n\n\
        2. Common mistakes:\n\
           • Missing quotes around strings\n\
           • Unclosed section brackets []\n\
           • Unknown value for max_tokens_field or coercion",
        path.display(),
        error,
        path.display()
    )
}

/// Wrap a generic error with a suggestion
pub fn wrap_error_with_suggestion(error: impl fmt::Display, suggestion: &str) -> String {
    format!("{}\n\n\x1b[1;33mSuggestion:\x1b[0m {}", error, suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_error_names_variable() {
        let msg = api_key_missing_error();
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(msg.contains(".env"));
    }

    #[test]
    fn test_missing_artifact_names_stage() {
        let msg = missing_artifact_error(
            Path::new("pipeline/data/run1/functions.json"),
            "Functions",
            "functions",
        );
        assert!(msg.contains("callsmith functions"));
        assert!(msg.contains("pipeline/data/run1"));
    }

    #[test]
    fn test_run_id_missing_suggests_first_stage() {
        let msg = run_id_missing_error(Path::new("run_id"));
        assert!(msg.contains("callsmith scenarios"));
    }

    #[test]
    fn test_wrap_error_keeps_message_and_suggestion() {
        let msg = wrap_error_with_suggestion("Curriculum not found", "create it");
        assert!(msg.starts_with("Curriculum not found"));
        assert!(msg.contains("Suggestion:"));
        assert!(msg.contains("create it"));
    }
}
