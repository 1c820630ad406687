// Engineered-format conversion
//
// Turns multi-turn traces into chat transcripts with tool descriptors and
// structured tool calls, one JSON object per line.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::records::{ChatMessage, EngineeredExample, FunctionsOutput, MultiTurnOutput, TraceEntry};
use super::run::{Artifact, RunContext};
use crate::functions::{call_name, parse_function_call, parse_signature, ToolSchema};

/// Label written on every converted example
pub const LABEL_KIND: &str = "full";

/// Function name -> ordered parameter names, from every parseable signature
pub fn parameter_index(inputs: &[FunctionsOutput]) -> HashMap<String, Vec<String>> {
    inputs
        .iter()
        .flat_map(|input| &input.functions)
        .filter_map(|spec| parse_signature(&spec.function))
        .map(|signature| {
            let names = signature.parameter_names();
            (signature.name, names)
        })
        .collect()
}

/// Tool descriptors for a sample, first signature wins per name
pub fn tools_for(function_schemas: &[String]) -> Vec<ToolSchema> {
    let mut seen = HashSet::new();
    function_schemas
        .iter()
        .filter_map(|text| parse_signature(text))
        .filter(|signature| seen.insert(signature.name.clone()))
        .map(|signature| ToolSchema::from_signature(&signature))
        .collect()
}

/// Chat messages for a trace, read in query/call/tool chunks
///
/// Conversion stops at a trailing chunk with fewer than two entries.
pub fn messages_for(trace: &[TraceEntry], params: &HashMap<String, Vec<String>>) -> Vec<ChatMessage> {
    let mut messages = Vec::new();

    for chunk in trace.chunks(3) {
        if chunk.len() < 2 {
            break;
        }

        if let TraceEntry::Query(query) = &chunk[0] {
            if !query.is_empty() {
                messages.push(ChatMessage::user(query.clone()));
            }
        }

        if let TraceEntry::FunctionCall(call) = &chunk[1] {
            if let Some(name) = call_name(call) {
                let param_names = params.get(name).map(Vec::as_slice).unwrap_or_default();
                let (name, arguments) = parse_function_call(call, param_names);
                messages.push(ChatMessage::assistant_call(name, arguments));
            }
        }

        if let Some(TraceEntry::Tool(response)) = chunk.get(2) {
            messages.push(ChatMessage::tool(response.clone()));
        }
    }

    messages
}

/// Run-scoped example id: `ex_{run_id}_{index:06}_{8 hex}`
pub fn example_id(run_id: &str, index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ex_{}_{:06}_{}", run_id, index, &suffix[..8])
}

pub fn build_example(
    run_id: &str,
    index: usize,
    sample: &MultiTurnOutput,
    params: &HashMap<String, Vec<String>>,
) -> EngineeredExample {
    EngineeredExample {
        id: example_id(run_id, index),
        tools: tools_for(&sample.function_schemas),
        messages: messages_for(&sample.trace, params),
        label_kind: LABEL_KIND.to_string(),
    }
}

/// Convert the run's multi-turn queries to JSONL
///
/// Writes to `out_path` or to the run's `multi_turn_eng.jsonl`.
pub fn convert_multi_turn(ctx: &RunContext, out_path: Option<&Path>) -> Result<PathBuf> {
    let functions: Vec<FunctionsOutput> = ctx.read_artifact(Artifact::Functions)?;
    let samples: Vec<MultiTurnOutput> = ctx.read_artifact(Artifact::MultiTurnQueries)?;
    let params = parameter_index(&functions);

    let out_path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.artifact_path(Artifact::MultiTurnEng));
    let file = File::create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);

    for (index, sample) in samples.iter().enumerate() {
        let example = build_example(ctx.run_id(), index, sample, &params);
        serde_json::to_writer(&mut writer, &example)
            .with_context(|| format!("Failed to serialize example {}", example.id))?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    tracing::info!(count = samples.len(), path = %out_path.display(), "Converted multi-turn queries");
    Ok(out_path)
}
