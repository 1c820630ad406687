// Prompt template rendering
//
// Templates are plain text with `{{name}}` placeholders. Rendering is a
// literal substitution: no escaping, no nesting, unbound placeholders stay.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Replace every `{{key}}` in `template` with its value from `vars`
pub fn render<K, V>(template: &str, vars: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut content = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{{{}}}}}", key.as_ref());
        content = content.replace(&placeholder, value.as_ref());
    }
    content
}

/// Read a template file and render it
///
/// A missing template is an error; the caller decides whether it is fatal.
pub fn render_file<K, V>(path: &Path, vars: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let template = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    Ok(render(&template, vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bound_and_unbound() {
        let out = render("Hi {{name}}, {{x}}", &[("name", "Bo")]);
        assert_eq!(out, "Hi Bo, {{x}}");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let out = render("{{a}}-{{a}}-{{b}}", &[("a", "1"), ("b", "2")]);
        assert_eq!(out, "1-1-2");
    }

    #[test]
    fn test_render_does_not_recurse() {
        // A value that looks like a placeholder is inserted verbatim
        let out = render("{{a}}", &[("a", "{{a}}")]);
        assert_eq!(out, "{{a}}");
    }

    #[test]
    fn test_render_file_missing() {
        let result = render_file(Path::new("/nonexistent/prompt.md"), &[("a", "b")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read template"));
    }

    #[test]
    fn test_render_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("prompt.md");
        fs::write(&path, "Domain: {{domain}}")?;

        let out = render_file(&path, &[("domain", "finance")])?;
        assert_eq!(out, "Domain: finance");
        Ok(())
    }
}
