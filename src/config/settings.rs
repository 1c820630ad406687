// Configuration structs

use serde::Deserialize;
use std::path::PathBuf;

use crate::functions::CoercionMode;
use crate::providers::{TokenLimit, TokenLimitField};

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub completion: CompletionConfig,
    pub paths: PathsConfig,
    pub stages: StageConfig,
}

/// Completion endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Provider name (only "openai"-compatible endpoints are supported)
    pub provider: String,

    /// API key; required before any completion call
    pub api_key: Option<String>,

    /// Endpoint base URL, without the `/v1/...` path
    pub base_url: String,

    pub model: String,

    pub temperature: f32,

    /// Generation limit; `None` sends no limit at all
    pub max_tokens: Option<u32>,

    /// Request field that carries `max_tokens` (differs across model families)
    pub max_tokens_field: TokenLimitField,

    pub request_timeout_secs: u64,

    /// Pause after every completion call
    pub rate_sleep_secs: f64,
}

impl CompletionConfig {
    pub fn token_limit(&self) -> Option<TokenLimit> {
        self.max_tokens.map(|value| TokenLimit {
            value,
            field: self.max_tokens_field,
        })
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: None,
            max_tokens_field: TokenLimitField::default(),
            request_timeout_secs: 120,
            rate_sleep_secs: 0.0,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of per-run artifact directories
    pub data_dir: PathBuf,

    /// Directory holding the stage prompt templates
    pub template_dir: PathBuf,

    /// File holding the current run identifier
    pub run_id_file: PathBuf,

    /// Curriculum CSV (domain, subdomain, entities)
    pub curriculum: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("pipeline/data"),
            template_dir: PathBuf::from("templates"),
            run_id_file: PathBuf::from("run_id"),
            curriculum: PathBuf::from("pipeline/data/curriculum.csv"),
        }
    }
}

/// Per-stage knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Scenarios requested per curriculum row
    pub num_scenarios: u32,

    /// Process at most this many curriculum rows
    pub scenario_row_limit: Option<usize>,

    /// Process at most this many scenarios in the functions stage
    pub function_scenario_limit: Option<usize>,

    /// Handling of <expected> values that do not fit their return type
    pub coercion: CoercionMode,

    /// Queries requested per function (simple)
    pub simple_num_queries: u32,

    /// Queries requested per function (parallel)
    pub parallel_num_queries: u32,

    /// Maximum number of simple queries turned into multiple-choice samples
    pub multiple_sample_cap: usize,

    /// Seed for distractor sampling; unseeded when absent
    pub multiple_seed: Option<u64>,

    pub queries: QueryToggles,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            num_scenarios: 10,
            scenario_row_limit: None,
            function_scenario_limit: None,
            coercion: CoercionMode::Lenient,
            simple_num_queries: 2,
            parallel_num_queries: 2,
            multiple_sample_cap: 10_000,
            multiple_seed: None,
            queries: QueryToggles::default(),
        }
    }
}

/// Which query generators run in the queries stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryToggles {
    pub simple: bool,
    pub parallel: bool,
    pub multiple: bool,
    pub multi_turn: bool,
}

impl QueryToggles {
    pub fn only_multi_turn() -> Self {
        Self {
            simple: false,
            parallel: false,
            multiple: false,
            multi_turn: true,
        }
    }
}

impl Default for QueryToggles {
    fn default() -> Self {
        Self {
            simple: true,
            parallel: true,
            multiple: true,
            multi_turn: true,
        }
    }
}
