use std::path::{Path, PathBuf};

use anyhow::Context;
use dealflow_config::FlowConfig;
use dealflow_core::capabilities::{CompletionClient, CompletionError};
use dealflow_db::service::FlowService;
use dealflow_filter::Pipelines;
use dealflow_llm::{CompletionHttpClient, LlmError};

/// Completion client for the process. Without an API key every call fails
/// with the "not configured" error, so commands that never reach an LLM gate
/// still run.
pub enum Completion {
    Http(CompletionHttpClient),
    Unconfigured,
}

impl CompletionClient for Completion {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        match self {
            Self::Http(client) => client.complete(prompt, model).await,
            Self::Unconfigured => Err(LlmError::NotConfigured.into()),
        }
    }
}

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: FlowService,
    pub config: FlowConfig,
    pub pipelines: Pipelines,
    pub completion: Completion,
}

impl AppContext {
    /// Open the store, load filter assets and build the pipelines.
    pub async fn init(config: FlowConfig, database_override: Option<&str>) -> anyhow::Result<Self> {
        let db_path = database_override.unwrap_or(&config.database.path).to_string();
        let parent = Path::new(&db_path)
            .parent()
            .filter(|dir| db_path != ":memory:" && !dir.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let service = FlowService::new_local(&db_path, trail_dir(&config))
            .await
            .with_context(|| format!("failed to open database at {db_path}"))?;

        let assets = config.filter_assets().context("failed to load filter assets")?;
        let pipelines =
            Pipelines::from_assets(&assets, config.filters.min_description_len, &config.llm.model)
                .context("failed to build filter pipelines")?
                .with_b2b_industries(
                    &config.filters.b2b_industries,
                    &assets.industry_tagging_prompt,
                    &config.llm.model,
                );

        let completion = match CompletionHttpClient::from_config(&config.llm) {
            Ok(client) => Completion::Http(client),
            Err(LlmError::NotConfigured) => Completion::Unconfigured,
            Err(error) => return Err(error).context("failed to build completion client"),
        };

        tracing::debug!(database = %db_path, trail = service.trail().is_enabled(), "context ready");

        Ok(Self {
            service,
            config,
            pipelines,
            completion,
        })
    }
}

/// Trail directory from the configuration. An empty value disables the trail.
pub fn trail_dir(config: &FlowConfig) -> Option<PathBuf> {
    let dir = config.events.trail_dir.trim();
    (!dir.is_empty()).then(|| PathBuf::from(dir))
}

/// Warn about sections that leave parts of the CLI inert.
pub fn warn_unconfigured(config: &FlowConfig) {
    if !config.llm.is_configured() {
        tracing::warn!("llm: not configured; LLM filter gates will fail");
    }
    if trail_dir(config).is_none() {
        tracing::warn!("events: trail_dir is empty; admission events are kept in the database only");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trail_dir_disables_trail() {
        let mut config = FlowConfig::default();
        assert_eq!(trail_dir(&config), Some(PathBuf::from(".dealflow/trail")));

        config.events.trail_dir = "  ".to_string();
        assert_eq!(trail_dir(&config), None);
    }

    #[tokio::test]
    async fn unconfigured_completion_reports_not_configured() {
        let err = Completion::Unconfigured.complete("prompt", "model").await.unwrap_err();
        assert!(matches!(err, CompletionError::Api { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn init_builds_pipelines_without_llm() {
        let mut config = FlowConfig::default();
        config.events.trail_dir = String::new();
        let ctx = AppContext::init(config, Some(":memory:")).await.unwrap();
        assert!(matches!(ctx.completion, Completion::Unconfigured));
        assert_eq!(ctx.pipelines.company.id, "filter_company_data");
        assert!(!ctx.service.trail().is_enabled());
    }

    #[tokio::test]
    async fn init_adds_b2b_industry_gate_when_configured() {
        let mut config = FlowConfig::default();
        config.events.trail_dir = String::new();
        config.filters.b2b_industries = vec!["TRANSPORTATION".to_string()];
        let ctx = AppContext::init(config, Some(":memory:")).await.unwrap();
        let last = ctx.pipelines.b2b_company.steps.last().unwrap();
        assert!(matches!(
            last,
            dealflow_filter::PipelineStep::Filter(dealflow_filter::filters::ProjectFilter::Tags(_))
        ));
    }
}
