// Run context
//
// A run is one pipeline invocation. Every artifact lives under
// `{data_dir}/{run_id}/`; the current run id is handed between stage
// invocations through a small text file.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::{missing_artifact_error, run_id_missing_error};

/// Files a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Manifest,
    Scenarios,
    Functions,
    SimpleQueries,
    ParallelQueries,
    MultipleQueries,
    MultiTurnQueries,
    MultiTurnEng,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Manifest => "run.json",
            Artifact::Scenarios => "scenarios.json",
            Artifact::Functions => "functions.json",
            Artifact::SimpleQueries => "simple_queries.json",
            Artifact::ParallelQueries => "parallel_queries.json",
            Artifact::MultipleQueries => "multiple_queries.json",
            Artifact::MultiTurnQueries => "multi_turn_queries.json",
            Artifact::MultiTurnEng => "multi_turn_eng.jsonl",
        }
    }

    /// Human-readable name used in error messages
    pub fn description(&self) -> &'static str {
        match self {
            Artifact::Manifest => "Run manifest",
            Artifact::Scenarios => "Scenarios",
            Artifact::Functions => "Functions",
            Artifact::SimpleQueries => "Simple queries",
            Artifact::ParallelQueries => "Parallel queries",
            Artifact::MultipleQueries => "Multiple queries",
            Artifact::MultiTurnQueries => "Multi-turn queries",
            Artifact::MultiTurnEng => "Engineered multi-turn examples",
        }
    }

    /// CLI subcommand that writes this artifact
    pub fn produced_by(&self) -> &'static str {
        match self {
            Artifact::Manifest | Artifact::Scenarios => "scenarios",
            Artifact::Functions => "functions",
            Artifact::SimpleQueries
            | Artifact::ParallelQueries
            | Artifact::MultipleQueries
            | Artifact::MultiTurnQueries => "queries",
            Artifact::MultiTurnEng => "convert",
        }
    }
}

/// Written once when a run is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
}

/// Identifier and artifact directory of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    run_id: String,
    run_dir: PathBuf,
}

impl RunContext {
    pub fn new(data_dir: &Path, run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            run_dir: data_dir.join(&run_id),
            run_id,
        }
    }

    /// Start a new run: fresh id, run directory, id file and manifest
    pub fn create(data_dir: &Path, run_id_file: &Path, model: &str) -> Result<Self> {
        let ctx = Self::new(data_dir, Uuid::new_v4().simple().to_string());

        fs::create_dir_all(&ctx.run_dir)
            .with_context(|| format!("Failed to create run directory {}", ctx.run_dir.display()))?;
        fs::write(run_id_file, &ctx.run_id)
            .with_context(|| format!("Failed to write run id to {}", run_id_file.display()))?;

        let manifest = RunManifest {
            run_id: ctx.run_id.clone(),
            created_at: Utc::now(),
            model: model.to_string(),
        };
        ctx.write_artifact(Artifact::Manifest, &manifest)?;

        tracing::info!(run_id = %ctx.run_id, "Created run");
        Ok(ctx)
    }

    /// Continue the run named in `run_id_file`
    pub fn resume(data_dir: &Path, run_id_file: &Path) -> Result<Self> {
        let contents = fs::read_to_string(run_id_file)
            .map_err(|_| anyhow!(run_id_missing_error(run_id_file)))?;
        let run_id = contents.trim();
        if run_id.is_empty() {
            return Err(anyhow!(run_id_missing_error(run_id_file)));
        }

        tracing::info!(run_id = %run_id, "Resuming run");
        Ok(Self::new(data_dir, run_id))
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.run_dir.join(artifact.file_name())
    }

    /// Fail with a message naming the producing stage when `artifact` is absent
    pub fn require(&self, artifact: Artifact) -> Result<PathBuf> {
        let path = self.artifact_path(artifact);
        if !path.exists() {
            return Err(anyhow!(missing_artifact_error(
                &path,
                artifact.description(),
                artifact.produced_by()
            )));
        }
        Ok(path)
    }

    pub fn read_artifact<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<T> {
        let path = self.require(artifact)?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write `value` as pretty JSON, replacing any previous file
    pub fn write_artifact<T: Serialize + ?Sized>(
        &self,
        artifact: Artifact,
        value: &T,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.run_dir)
            .with_context(|| format!("Failed to create run directory {}", self.run_dir.display()))?;

        let path = self.artifact_path(artifact);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", artifact.description()))?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Wrote artifact");
        Ok(path)
    }
}
