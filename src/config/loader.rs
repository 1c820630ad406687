// Configuration loader
// Loads settings from callsmith.toml (optional) and environment variables

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::settings::{Config, QueryToggles};
use crate::errors::config_parse_error;
use crate::providers::TokenLimitField;

/// Config file read when `CALLSMITH_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "callsmith.toml";

/// Load configuration: `.env`, then the TOML file, then environment overrides
pub fn load_config() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config_path = std::env::var("CALLSMITH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = if config_path.exists() {
        load_from_file(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a TOML config file; missing sections take their defaults
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).map_err(|e| anyhow!(config_parse_error(path, e)))
}

/// Overlay environment variables onto `config`
///
/// `lookup` returns the raw value of a variable. Values that fail to parse
/// are logged and ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let completion = &mut config.completion;
    if let Some(key) = get("OPENAI_API_KEY") {
        completion.api_key = Some(key);
    }
    if let Some(url) = get("OPENAI_BASE_URL") {
        completion.base_url = url;
    }
    if let Some(model) = get("OPENAI_MODEL") {
        completion.model = model;
    }
    if let Some(temperature) = parse_var(&get, "OPENAI_TEMPERATURE") {
        completion.temperature = temperature;
    }
    if let Some(max_tokens) = parse_var(&get, "OPENAI_MAX_TOKENS") {
        completion.max_tokens = Some(max_tokens);
    }
    if let Some(field) = get("OPENAI_MAX_TOKENS_FIELD") {
        completion.max_tokens_field = TokenLimitField::from_name(&field);
    }
    if let Some(secs) = parse_var(&get, "OPENAI_RATE_SLEEP") {
        completion.rate_sleep_secs = secs;
    }
    if let Some(secs) = parse_var(&get, "OPENAI_TIMEOUT_SECS") {
        completion.request_timeout_secs = secs;
    }

    let stages = &mut config.stages;
    if let Some(n) = parse_var(&get, "S1_NUM_SCENARIOS") {
        stages.num_scenarios = n;
    }
    if let Some(n) = parse_var(&get, "S1_LIMIT_ROWS") {
        stages.scenario_row_limit = Some(n);
    }
    if let Some(n) = parse_var(&get, "S2_LIMIT_SCENARIOS") {
        stages.function_scenario_limit = Some(n);
    }
    if let Some(strict) = get("S2_STRICT_COERCION") {
        stages.coercion = if is_truthy(&strict) {
            crate::functions::CoercionMode::Strict
        } else {
            crate::functions::CoercionMode::Lenient
        };
    }
    if let Some(n) = parse_var(&get, "S3_SIMPLE_NUM") {
        stages.simple_num_queries = n;
    }
    if let Some(n) = parse_var(&get, "S3_PARALLEL_NUM") {
        stages.parallel_num_queries = n;
    }
    if let Some(n) = parse_var(&get, "S3_MULTIPLE_LIMIT") {
        stages.multiple_sample_cap = n;
    }
    if let Some(seed) = parse_var(&get, "S3_MULTIPLE_SEED") {
        stages.multiple_seed = Some(seed);
    }

    let toggles = &mut stages.queries;
    if let Some(v) = get("ENABLE_SIMPLE") {
        toggles.simple = is_truthy(&v);
    }
    if let Some(v) = get("ENABLE_PARALLEL") {
        toggles.parallel = is_truthy(&v);
    }
    if let Some(v) = get("ENABLE_MULTIPLE") {
        toggles.multiple = is_truthy(&v);
    }
    if let Some(v) = get("ENABLE_MULTI_TURN") {
        toggles.multi_turn = is_truthy(&v);
    }
    if get("ONLY_MULTI_TURN").is_some_and(|v| is_truthy(&v)) {
        *toggles = QueryToggles::only_multi_turn();
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Option<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={}: not a valid number", key, raw);
            None
        }
    }
}

/// Flags are on for "1" or "true" (any case)
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
