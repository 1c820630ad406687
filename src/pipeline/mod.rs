// Pipeline stages
//
// curriculum -> scenarios -> functions -> queries -> engineered JSONL -> validation.
// Each stage reads the previous artifact from the run directory and writes
// its own artifact once, at the end.

pub mod convert;
pub mod distractors;
pub mod functions;
pub mod queries;
pub mod records;
pub mod run;
pub mod scenarios;
pub mod stage;
pub mod validate;

pub use convert::convert_multi_turn;
pub use distractors::{build_distractor_map, generate_multiple_queries};
pub use functions::generate_functions;
pub use queries::{generate_call_queries, generate_multi_turn_queries, generate_queries, QueryKind};
pub use records::*;
pub use run::{Artifact, RunContext, RunManifest};
pub use scenarios::{generate_scenarios, read_curriculum};
pub use stage::StageRunner;
pub use validate::{validate_jsonl, LineIssue, ValidationReport};
