// Shared stage plumbing
//
// Render a template, ask the provider, pause for the rate limit.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::providers::{CompletionProvider, CompletionRequest};
use crate::text::render_file;

/// Completion access shared by the prompting stages
pub struct StageRunner<'a> {
    provider: &'a dyn CompletionProvider,
    template_dir: PathBuf,
    rate_sleep: Duration,
}

impl<'a> StageRunner<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            template_dir: template_dir.into(),
            rate_sleep: Duration::ZERO,
        }
    }

    /// Pause after every completion call; negative or non-finite values disable it
    pub fn with_rate_sleep(mut self, secs: f64) -> Self {
        self.rate_sleep = Duration::try_from_secs_f64(secs).unwrap_or_default();
        self
    }

    /// Render `template` with `vars` and return the completion text
    pub async fn prompt(&self, template: &str, vars: &[(&str, &str)], system: &str) -> Result<String> {
        let path = self.template_dir.join(template);
        let prompt = render_file(&path, vars)?;

        let request = CompletionRequest::new(prompt).with_system(system);
        let content = self
            .provider
            .complete(&request)
            .await
            .with_context(|| format!("Completion failed for template {}", template))?;

        tracing::debug!(template, chars = content.len(), "Received completion");

        if !self.rate_sleep.is_zero() {
            tokio::time::sleep(self.rate_sleep).await;
        }

        Ok(content)
    }
}

/// Progress bar for a per-row stage loop
pub fn progress_bar(len: usize, stage: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{msg:>12} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(stage.to_string());
    pb
}

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::providers::{CompletionProvider, CompletionRequest};

    /// Provider that replays canned responses and records prompts
    pub struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        pub prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<CompletionRequest> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("no scripted response left"))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }
    }
}
