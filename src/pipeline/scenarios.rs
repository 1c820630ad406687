// Scenario stage: curriculum rows -> scenarios.json

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use super::records::{CurriculumRow, Scenario};
use super::run::{Artifact, RunContext};
use super::stage::{progress_bar, StageRunner};
use crate::config::StageConfig;
use crate::errors::wrap_error_with_suggestion;
use crate::text::extract_tags;

pub const SCENARIO_TEMPLATE: &str = "scenario.md";

const SYSTEM_PROMPT: &str = "You are a careful data generator. Follow the format strictly and \
     wrap each scenario inside <scenario> tags.";

/// Load curriculum rows (`domain,subdomain[,entities]`)
pub fn read_curriculum(path: &Path) -> Result<Vec<CurriculumRow>> {
    if !path.exists() {
        return Err(anyhow!(wrap_error_with_suggestion(
            format!("Curriculum not found: {}", path.display()),
            "create a CSV with a domain,subdomain[,entities] header or set paths.curriculum",
        )));
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .deserialize::<CurriculumRow>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Bad curriculum row {} in {}", i + 1, path.display())))
        .collect()
}

/// Scenarios from one completion; blank tags are dropped
pub fn scenarios_from_response(row: &CurriculumRow, content: &str) -> Vec<Scenario> {
    extract_tags(content, "scenario")
        .iter()
        .filter_map(|text| Scenario::new(row, text).ok())
        .collect()
}

/// Run the scenario stage and write `scenarios.json`
pub async fn generate_scenarios(
    ctx: &RunContext,
    runner: &StageRunner<'_>,
    curriculum: &Path,
    settings: &StageConfig,
) -> Result<Vec<Scenario>> {
    let mut rows = read_curriculum(curriculum)?;
    if let Some(limit) = settings.scenario_row_limit {
        rows.truncate(limit);
    }

    tracing::info!(rows = rows.len(), "Generating scenarios");

    let num_scenarios = settings.num_scenarios.to_string();
    let pb = progress_bar(rows.len(), "scenarios");
    let mut scenarios = Vec::new();

    for row in &rows {
        let content = runner
            .prompt(
                SCENARIO_TEMPLATE,
                &[
                    ("domain", row.domain.as_str()),
                    ("subdomain", row.subdomain.as_str()),
                    ("entities", row.entities.as_str()),
                    ("num_scenarios", num_scenarios.as_str()),
                ],
                SYSTEM_PROMPT,
            )
            .await?;

        let generated = scenarios_from_response(row, &content);
        if generated.is_empty() {
            tracing::warn!(domain = %row.domain, subdomain = %row.subdomain, "No scenarios in response");
        }
        scenarios.extend(generated);
        pb.inc(1);
    }
    pb.finish_and_clear();

    ctx.write_artifact(Artifact::Scenarios, &scenarios)?;
    tracing::info!(count = scenarios.len(), "Generated scenarios");
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::testing::ScriptedProvider;
    use std::fs;
    use tempfile::TempDir;

    fn write_curriculum(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("curriculum.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_curriculum_optional_entities() {
        let dir = TempDir::new().unwrap();
        let path = write_curriculum(dir.path(), "domain,subdomain\ntravel,flights\nfinance,tax\n");

        let rows = read_curriculum(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].domain, "travel");
        assert_eq!(rows[1].entities, "");
    }

    #[test]
    fn test_read_curriculum_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_curriculum(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("Curriculum not found"));
    }

    #[test]
    fn test_blank_scenarios_dropped() {
        let row = CurriculumRow {
            domain: "d".to_string(),
            subdomain: "s".to_string(),
            entities: "e".to_string(),
        };
        let scenarios =
            scenarios_from_response(&row, "<scenario> A </scenario><scenario>  </scenario>");
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].scenario, "A");
        assert_eq!(scenarios[0].entities, "e");
    }

    #[tokio::test]
    async fn test_generate_scenarios_respects_row_limit() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SCENARIO_TEMPLATE), "{{domain}}/{{subdomain}} x{{num_scenarios}}")
            .unwrap();
        let curriculum = write_curriculum(
            dir.path(),
            "domain,subdomain,entities\ntravel,flights,airports\nfinance,tax,forms\n",
        );

        let provider = ScriptedProvider::new(["<scenario>Plan a trip</scenario><scenario>Rebook</scenario>"]);
        let runner = StageRunner::new(&provider, dir.path());
        let ctx = RunContext::new(dir.path(), "run1");
        let settings = StageConfig {
            scenario_row_limit: Some(1),
            num_scenarios: 2,
            ..StageConfig::default()
        };

        let scenarios = generate_scenarios(&ctx, &runner, &curriculum, &settings)
            .await
            .unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(provider.prompts()[0].prompt, "travel/flights x2");

        let saved: Vec<Scenario> = ctx.read_artifact(Artifact::Scenarios).unwrap();
        assert_eq!(saved, scenarios);
    }
}
