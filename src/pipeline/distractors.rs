// Multiple-choice queries
//
// No completion calls here: each simple query is offered together with
// distractor functions drawn from the same scenario and, sometimes, one
// function from another scenario.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::records::{FunctionsOutput, MultipleQueryOutput, SimpleQueryOutput};
use super::run::{Artifact, RunContext};
use crate::config::StageConfig;

/// Map each function's signature text to its distractor signatures
///
/// Siblings are the other functions of the same entry. With even odds two
/// or three of them are sampled (all of them when fewer exist). Then, with
/// even odds and when another entry exists, one function from a random
/// other entry is added. A function is never its own distractor.
pub fn build_distractor_map<R: Rng + ?Sized>(
    inputs: &[FunctionsOutput],
    rng: &mut R,
) -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();

    for (idx, input) in inputs.iter().enumerate() {
        for spec in &input.functions {
            let siblings: Vec<&String> = input
                .functions
                .iter()
                .map(|other| &other.function)
                .filter(|other| **other != spec.function)
                .collect();

            let wanted = if rng.gen_bool(0.5) { 2 } else { 3 };
            let mut distractors: Vec<String> = siblings
                .choose_multiple(rng, wanted)
                .map(|s| (*s).clone())
                .collect();

            if rng.gen_bool(0.5) && inputs.len() > 1 {
                if let Some(outer) = pick_outer_function(inputs, idx, rng) {
                    if *outer != spec.function && !distractors.contains(outer) {
                        distractors.push(outer.clone());
                    }
                }
            }

            map.insert(spec.function.clone(), distractors);
        }
    }

    map
}

/// Random function from a random entry other than `skip`
fn pick_outer_function<'a, R: Rng + ?Sized>(
    inputs: &'a [FunctionsOutput],
    skip: usize,
    rng: &mut R,
) -> Option<&'a String> {
    let others: Vec<usize> = (0..inputs.len()).filter(|&i| i != skip).collect();
    let entry = &inputs[*others.choose(rng)?];
    entry.functions.choose(rng).map(|spec| &spec.function)
}

/// Attach distractors to a random subsample of at most `cap` simple queries
pub fn sample_multiple_queries<R: Rng + ?Sized>(
    simple: &[SimpleQueryOutput],
    distractors: &HashMap<String, Vec<String>>,
    cap: usize,
    rng: &mut R,
) -> Vec<MultipleQueryOutput> {
    let k = simple.len().min(cap);
    simple
        .choose_multiple(rng, k)
        .map(|query| {
            let extra = distractors
                .get(&query.function_schema)
                .map(Vec::as_slice)
                .unwrap_or_default();
            MultipleQueryOutput::from_simple(query.clone(), extra)
        })
        .collect()
}

/// Build `multiple_queries.json` from `functions.json` and `simple_queries.json`
pub fn generate_multiple_queries(
    ctx: &RunContext,
    settings: &StageConfig,
) -> Result<Vec<MultipleQueryOutput>> {
    let inputs: Vec<FunctionsOutput> = ctx.read_artifact(Artifact::Functions)?;
    let simple: Vec<SimpleQueryOutput> = ctx.read_artifact(Artifact::SimpleQueries)?;

    let mut rng = match settings.multiple_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let distractors = build_distractor_map(&inputs, &mut rng);
    let samples =
        sample_multiple_queries(&simple, &distractors, settings.multiple_sample_cap, &mut rng);

    ctx.write_artifact(Artifact::MultipleQueries, &samples)?;
    tracing::info!(count = samples.len(), "Generated multiple-choice queries");
    Ok(samples)
}
