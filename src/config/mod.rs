// Configuration module

mod loader;
mod settings;

pub use loader::{apply_env_overrides, load_config, load_from_file, DEFAULT_CONFIG_FILE};
pub use settings::{CompletionConfig, Config, PathsConfig, QueryToggles, StageConfig};
