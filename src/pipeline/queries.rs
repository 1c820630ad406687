// Query stage: functions.json -> simple / parallel / multiple / multi-turn queries

use anyhow::{Context, Result};

use super::distractors::generate_multiple_queries;
use super::records::{FunctionsOutput, MultiTurnOutput, SimpleQueryOutput, TraceEntry};
use super::run::{Artifact, RunContext};
use super::stage::{progress_bar, StageRunner};
use crate::config::StageConfig;
use crate::text::extract_tags;

pub const SIMPLE_TEMPLATE: &str = "simple.md";
pub const PARALLEL_TEMPLATE: &str = "parallel.md";
pub const MULTI_TURN_TEMPLATE: &str = "multiturn.md";

const SIMPLE_SYSTEM_PROMPT: &str = "You are a careful data generator. Output multiple <user_query> \
     and <function_call> tag pairs as instructed.";
const PARALLEL_SYSTEM_PROMPT: &str = "You are a careful data generator. Output <user_query> and \
     <function_calls> pairs as instructed.";
const MULTI_TURN_SYSTEM_PROMPT: &str = "You are a careful data generator. Produce a <dialogue> \
     containing repeated <query>, <function_call>, and <tool> tags as per instructions.";

/// Single-call or multi-call query generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Simple,
    Parallel,
}

impl QueryKind {
    fn template(&self) -> &'static str {
        match self {
            QueryKind::Simple => SIMPLE_TEMPLATE,
            QueryKind::Parallel => PARALLEL_TEMPLATE,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            QueryKind::Simple => SIMPLE_SYSTEM_PROMPT,
            QueryKind::Parallel => PARALLEL_SYSTEM_PROMPT,
        }
    }

    /// Tag holding the answer to each `<user_query>`
    fn call_tag(&self) -> &'static str {
        match self {
            QueryKind::Simple => "function_call",
            QueryKind::Parallel => "function_calls",
        }
    }

    fn artifact(&self) -> Artifact {
        match self {
            QueryKind::Simple => Artifact::SimpleQueries,
            QueryKind::Parallel => Artifact::ParallelQueries,
        }
    }

    fn num_queries(&self, settings: &StageConfig) -> u32 {
        match self {
            QueryKind::Simple => settings.simple_num_queries,
            QueryKind::Parallel => settings.parallel_num_queries,
        }
    }
}

/// Pair `<user_query>` tags with call tags by position; extras are dropped
pub fn pair_queries(content: &str, call_tag: &str) -> Vec<(String, String)> {
    let queries = extract_tags(content, "user_query");
    let calls = extract_tags(content, call_tag);
    if queries.len() != calls.len() {
        tracing::debug!(
            queries = queries.len(),
            calls = calls.len(),
            "Unpaired query tags dropped"
        );
    }
    queries.into_iter().zip(calls).collect()
}

/// Build a query/call/tool trace from the first `<dialogue>` block
///
/// Returns `None` when there is no dialogue. Tag lists of different
/// lengths are truncated to the shortest.
pub fn trace_from_response(content: &str) -> Option<Vec<TraceEntry>> {
    let dialogue = extract_tags(content, "dialogue").into_iter().next()?;

    let queries = extract_tags(&dialogue, "query");
    let calls = extract_tags(&dialogue, "function_call");
    let tools = extract_tags(&dialogue, "tool");

    if queries.len() != calls.len() || calls.len() != tools.len() {
        tracing::warn!(
            queries = queries.len(),
            calls = calls.len(),
            tools = tools.len(),
            "Dialogue tag counts differ, truncating to the shortest"
        );
    }

    let mut trace = Vec::with_capacity(queries.len() * 3);
    for ((query, call), tool) in queries.into_iter().zip(calls).zip(tools) {
        trace.push(TraceEntry::Query(query));
        trace.push(TraceEntry::FunctionCall(call));
        trace.push(TraceEntry::Tool(tool));
    }
    Some(trace)
}

/// Generate simple or parallel queries for every function
pub async fn generate_call_queries(
    ctx: &RunContext,
    runner: &StageRunner<'_>,
    settings: &StageConfig,
    kind: QueryKind,
) -> Result<Vec<SimpleQueryOutput>> {
    let inputs: Vec<FunctionsOutput> = ctx.read_artifact(Artifact::Functions)?;
    let total: usize = inputs.iter().map(|input| input.functions.len()).sum();

    tracing::info!(functions = total, kind = ?kind, "Generating queries");

    let num_queries = kind.num_queries(settings).to_string();
    let pb = progress_bar(total, kind.call_tag());
    let mut dataset = Vec::new();

    for input in &inputs {
        for spec in &input.functions {
            let content = runner
                .prompt(
                    kind.template(),
                    &[
                        ("function_schema", spec.function.as_str()),
                        ("num_queries", num_queries.as_str()),
                        ("scenario", input.scenario.as_str()),
                    ],
                    kind.system_prompt(),
                )
                .await?;

            for (user_query, function_call) in pair_queries(&content, kind.call_tag()) {
                dataset.push(SimpleQueryOutput {
                    user_query,
                    function_call,
                    function_schema: spec.function.clone(),
                    domain: input.domain.clone(),
                    subdomain: input.subdomain.clone(),
                });
            }
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    ctx.write_artifact(kind.artifact(), &dataset)?;
    tracing::info!(count = dataset.len(), kind = ?kind, "Generated queries");
    Ok(dataset)
}

/// Generate one multi-turn dialogue per functions entry
pub async fn generate_multi_turn_queries(
    ctx: &RunContext,
    runner: &StageRunner<'_>,
) -> Result<Vec<MultiTurnOutput>> {
    let inputs: Vec<FunctionsOutput> = ctx.read_artifact(Artifact::Functions)?;

    tracing::info!(entries = inputs.len(), "Generating multi-turn dialogues");

    let pb = progress_bar(inputs.len(), "multi-turn");
    let mut dataset = Vec::new();

    for input in &inputs {
        let function_schemas = serde_json::to_string(&input.functions)
            .context("Failed to serialize function list")?;
        let content = runner
            .prompt(
                MULTI_TURN_TEMPLATE,
                &[
                    ("scenario", input.scenario.as_str()),
                    ("function_schemas", function_schemas.as_str()),
                ],
                MULTI_TURN_SYSTEM_PROMPT,
            )
            .await?;
        pb.inc(1);

        let Some(trace) = trace_from_response(&content) else {
            tracing::warn!(scenario = %input.scenario, "No <dialogue> in response, skipping");
            continue;
        };

        dataset.push(MultiTurnOutput {
            trace,
            function_schemas: input.functions.iter().map(|f| f.function.clone()).collect(),
            domain: input.domain.clone(),
            subdomain: input.subdomain.clone(),
        });
    }
    pb.finish_and_clear();

    ctx.write_artifact(Artifact::MultiTurnQueries, &dataset)?;
    tracing::info!(count = dataset.len(), "Generated multi-turn dialogues");
    Ok(dataset)
}

/// Run every enabled query generator in order
///
/// Multiple-choice queries reuse the simple queries, so they run after them.
pub async fn generate_queries(
    ctx: &RunContext,
    runner: &StageRunner<'_>,
    settings: &StageConfig,
) -> Result<()> {
    let toggles = settings.queries;

    if toggles.simple {
        generate_call_queries(ctx, runner, settings, QueryKind::Simple).await?;
    }
    if toggles.parallel {
        generate_call_queries(ctx, runner, settings, QueryKind::Parallel).await?;
    }
    if toggles.multiple {
        generate_multiple_queries(ctx, settings)?;
    }
    if toggles.multi_turn {
        generate_multi_turn_queries(ctx, runner).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryToggles;
    use crate::pipeline::stage::testing::ScriptedProvider;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup(dir: &Path) -> RunContext {
        for template in [SIMPLE_TEMPLATE, PARALLEL_TEMPLATE, MULTI_TURN_TEMPLATE] {
            fs::write(dir.join(template), "{{function_schema}}|{{num_queries}}|{{function_schemas}}")
                .unwrap();
        }
        let ctx = RunContext::new(dir, "run1");
        ctx.write_artifact(
            Artifact::Functions,
            &json!([{
                "scenario": "Weather lookups",
                "domain": "weather",
                "subdomain": "forecast",
                "functions": [
                    {"function": "def forecast(city: str, days: int = 3) -> dict:", "expected": {}},
                    {"function": "def alerts(region: str) -> list[str]:", "expected": []}
                ]
            }]),
        )
        .unwrap();
        ctx
    }

    #[test]
    fn test_pair_queries_zips_by_position() {
        let pairs = pair_queries(
            "<user_query>a</user_query><function_call>f(1)</function_call>\
             <user_query>b</user_query>",
            "function_call",
        );
        assert_eq!(pairs, vec![("a".to_string(), "f(1)".to_string())]);
    }

    #[test]
    fn test_parallel_tag_not_confused_with_single() {
        let content = "<user_query>q</user_query><function_calls>f(1)\ng(2)</function_calls>";
        assert!(pair_queries(content, "function_call").is_empty());
        assert_eq!(pair_queries(content, "function_calls")[0].1, "f(1)\ng(2)");
    }

    #[test]
    fn test_trace_truncates_to_shortest() {
        let trace = trace_from_response(
            "<dialogue><query>q1</query><function_call>f()</function_call><tool>r1</tool>\
             <query>q2</query><function_call>g()</function_call></dialogue>",
        )
        .unwrap();
        assert_eq!(
            trace,
            vec![
                TraceEntry::Query("q1".to_string()),
                TraceEntry::FunctionCall("f()".to_string()),
                TraceEntry::Tool("r1".to_string()),
            ]
        );
    }

    #[test]
    fn test_trace_uses_first_dialogue_only() {
        let trace = trace_from_response(
            "<dialogue><query>a</query><function_call>f()</function_call><tool>x</tool></dialogue>\
             <dialogue><query>b</query><function_call>g()</function_call><tool>y</tool></dialogue>",
        )
        .unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0], TraceEntry::Query("a".to_string()));
        assert!(trace_from_response("no dialogue").is_none());
    }

    #[tokio::test]
    async fn test_simple_queries_keep_signature_text() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(dir.path());
        let provider = ScriptedProvider::new([
            "<user_query>Weather in Oslo?</user_query><function_call>forecast(city='Oslo')</function_call>",
            "<user_query>Any alerts?</user_query><function_call>alerts('north')</function_call>\
             <user_query>Alerts south?</user_query><function_call>alerts('south')</function_call>",
        ]);
        let runner = StageRunner::new(&provider, dir.path());
        let settings = StageConfig {
            simple_num_queries: 5,
            ..StageConfig::default()
        };

        let dataset = generate_call_queries(&ctx, &runner, &settings, QueryKind::Simple)
            .await
            .unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset[0].function_schema, "def forecast(city: str, days: int = 3) -> dict:");
        assert_eq!(dataset[2].function_call, "alerts('south')");
        assert!(provider.prompts()[0].prompt.contains("|5|"));
    }

    #[tokio::test]
    async fn test_multi_turn_prompt_and_output() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(dir.path());
        let provider = ScriptedProvider::new([
            "<dialogue><query>Oslo?</query><function_call>forecast('Oslo')</function_call>\
             <tool>{\"temp\": 3}</tool></dialogue>",
        ]);
        let runner = StageRunner::new(&provider, dir.path());

        let dataset = generate_multi_turn_queries(&ctx, &runner).await.unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset[0].trace.len(), 3);
        assert_eq!(dataset[0].function_schemas.len(), 2);

        let prompt = &provider.prompts()[0].prompt;
        assert!(prompt.contains(r#"[{"function":"def forecast(city: str, days: int = 3) -> dict:","expected":{}}"#));
    }

    #[tokio::test]
    async fn test_only_multi_turn_skips_other_generators() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(dir.path());
        let provider = ScriptedProvider::new(["no dialogue here"]);
        let runner = StageRunner::new(&provider, dir.path());
        let settings = StageConfig {
            queries: QueryToggles::only_multi_turn(),
            ..StageConfig::default()
        };

        generate_queries(&ctx, &runner, &settings).await.unwrap();
        assert_eq!(provider.prompts().len(), 1);
        assert!(!ctx.artifact_path(Artifact::SimpleQueries).exists());

        let saved: Vec<MultiTurnOutput> = ctx.read_artifact(Artifact::MultiTurnQueries).unwrap();
        assert!(saved.is_empty());
    }
}
