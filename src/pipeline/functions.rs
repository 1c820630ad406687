// Function stage: scenarios.json -> functions.json

use anyhow::{Context, Result};

use super::records::{FunctionSpec, FunctionsOutput, Scenario};
use super::run::{Artifact, RunContext};
use super::stage::{progress_bar, StageRunner};
use crate::config::StageConfig;
use crate::functions::{coerce_expected, parse_signature, CoercionError, CoercionMode};
use crate::text::{extract_code_fences, extract_tags};

pub const FUNCTIONS_TEMPLATE: &str = "functions.md";

const SYSTEM_PROMPT: &str = "You are a careful data generator. Follow the format strictly, include \
     multiple <function> blocks each with a <signature> code fence and an <expected> value.";

/// Extract function specs from one completion
///
/// Each `<function>` block needs a `<signature>` holding a python code
/// fence; blocks without one are skipped. The first `<expected>` value is
/// coerced by the signature's return type.
pub fn functions_from_response(
    content: &str,
    mode: CoercionMode,
) -> Result<Vec<FunctionSpec>, CoercionError> {
    let mut functions = Vec::new();

    for block in extract_tags(content, "function") {
        let Some(signature_block) = extract_tags(&block, "signature").into_iter().next() else {
            continue;
        };
        let Some(function) = extract_code_fences(&signature_block, "python").into_iter().next()
        else {
            tracing::debug!("Skipping <signature> without a python code fence");
            continue;
        };

        let return_type = parse_signature(&function)
            .map(|signature| signature.return_type)
            .unwrap_or_default();
        let expected_text = extract_tags(&block, "expected")
            .into_iter()
            .next()
            .unwrap_or_default();
        let expected = coerce_expected(&expected_text, &return_type, mode)?;

        functions.push(FunctionSpec { function, expected });
    }

    Ok(functions)
}

/// Run the function stage and write `functions.json`
pub async fn generate_functions(
    ctx: &RunContext,
    runner: &StageRunner<'_>,
    settings: &StageConfig,
) -> Result<Vec<FunctionsOutput>> {
    let mut scenarios: Vec<Scenario> = ctx.read_artifact(Artifact::Scenarios)?;
    if let Some(limit) = settings.function_scenario_limit {
        scenarios.truncate(limit);
    }

    tracing::info!(scenarios = scenarios.len(), "Generating functions");

    let pb = progress_bar(scenarios.len(), "functions");
    let mut outputs = Vec::with_capacity(scenarios.len());

    for scenario in &scenarios {
        let content = runner
            .prompt(
                FUNCTIONS_TEMPLATE,
                &[("scenario", scenario.scenario.as_str())],
                SYSTEM_PROMPT,
            )
            .await?;

        let functions = functions_from_response(&content, settings.coercion)
            .with_context(|| format!("Bad <expected> value for scenario '{}'", scenario.scenario))?;

        outputs.push(FunctionsOutput {
            scenario: scenario.scenario.clone(),
            domain: scenario.domain.clone(),
            subdomain: scenario.subdomain.clone(),
            functions,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    ctx.write_artifact(Artifact::Functions, &outputs)?;
    tracing::info!(
        scenarios = outputs.len(),
        functions = outputs.iter().map(|o| o.functions.len()).sum::<usize>(),
        "Generated functions"
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::testing::ScriptedProvider;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const RESPONSE: &str = r#"
<function>
<signature>
```python
def add(x: int, y: int = 1) -> int:
```
</signature>
<expected> 3 </expected>
</function>
<function>
<signature>no fence here</signature>
<expected>1</expected>
</function>
<function>
<signature>
```python
def tags(limit: int) -> list[str]:
```
</signature>
<expected>["a", "b"]</expected>
</function>
<function>
<signature>
```python
def note(text: str) -> str:
```
</signature>
</function>
"#;

    #[test]
    fn test_functions_from_response() {
        let functions = functions_from_response(RESPONSE, CoercionMode::Lenient).unwrap();
        assert_eq!(functions.len(), 3);
        assert_eq!(functions[0].function, "def add(x: int, y: int = 1) -> int:");
        assert_eq!(functions[0].expected, json!(3));
        assert_eq!(functions[1].expected, json!(["a", "b"]));
        assert_eq!(functions[2].expected, json!(""));
    }

    #[test]
    fn test_strict_mode_rejects_bad_expected() {
        let response = "<function><signature>```python\ndef n() -> int:\n```</signature>\
                        <expected>many</expected></function>";
        assert!(functions_from_response(response, CoercionMode::Strict).is_err());
        assert_eq!(
            functions_from_response(response, CoercionMode::Lenient).unwrap()[0].expected,
            json!("many")
        );
    }

    #[tokio::test]
    async fn test_every_scenario_gets_an_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FUNCTIONS_TEMPLATE), "{{scenario}}").unwrap();
        let ctx = RunContext::new(dir.path(), "run1");
        ctx.write_artifact(
            Artifact::Scenarios,
            &json!([
                {"domain": "d", "subdomain": "s", "entities": "", "scenario": "first"},
                {"domain": "d", "subdomain": "s", "entities": "", "scenario": "second"}
            ]),
        )
        .unwrap();

        let provider = ScriptedProvider::new([RESPONSE, "nothing useful"]);
        let runner = StageRunner::new(&provider, dir.path());
        let outputs = generate_functions(&ctx, &runner, &StageConfig::default())
            .await
            .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].functions.len(), 3);
        assert!(outputs[1].functions.is_empty());

        let saved: Vec<FunctionsOutput> = ctx.read_artifact(Artifact::Functions).unwrap();
        assert_eq!(saved, outputs);
    }

    #[tokio::test]
    async fn test_missing_scenarios_artifact() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new(Vec::<String>::new());
        let runner = StageRunner::new(&provider, dir.path());
        let ctx = RunContext::new(dir.path(), "run1");

        let err = generate_functions(&ctx, &runner, &StageConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("callsmith scenarios"));
    }
}
