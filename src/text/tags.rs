// Delimited content extraction from model output
//
// Model responses wrap each generated item in XML-like tags
// (<scenario>...</scenario>) or fenced code blocks (```python ... ```).

use regex::Regex;

/// Extract the trimmed inner text of every `<tag>...</tag>` span
///
/// Matching is case-insensitive and spans line breaks. The first closing
/// tag ends a span, so nested same-named tags are not supported.
pub fn extract_tags(text: &str, tag: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let tag = regex::escape(tag);
    let pattern = format!(r"(?is)<{tag}>(.*?)</{tag}>");
    extract_with(&pattern, text)
}

/// Extract the trimmed bodies of fenced code blocks labelled `lang`
pub fn extract_code_fences(text: &str, lang: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let pattern = format!(r"(?is)```{}\s*(.*?)```", regex::escape(lang));
    extract_with(&pattern, text)
}

fn extract_with(pattern: &str, text: &str) -> Vec<String> {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!("Invalid extraction pattern {}: {}", pattern, e);
            return Vec::new();
        }
    };

    regex
        .captures_iter(text)
        .filter_map(|capture| capture.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
