use std::future::Future;
use std::pin::Pin;

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::enums::CombineMode;
use dealflow_core::filters::{CombinedFilterConfig, FilterConfig, FilterOutput, FilterResult};
use dealflow_core::project::ProjectData;
use serde_json::Value;

use super::ProjectFilter;
use crate::context::{FilterContext, FilterEnv};
use crate::error::FilterError;

/// Maximum nesting of combined filters.
pub const MAX_DEPTH: usize = 3;

type EvalFuture<'a> = Pin<Box<dyn Future<Output = Result<FilterResult, FilterError>> + Send + 'a>>;

/// AND / OR composition of filters.
#[derive(Debug, Clone)]
pub struct CombinedFilter {
    id: String,
    display_name: String,
    none_value_should_pass: bool,
    mode: CombineMode,
    filters: Vec<ProjectFilter>,
}

impl CombinedFilter {
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] when nesting exceeds [`MAX_DEPTH`].
    pub fn new(
        id: &str,
        display_name: &str,
        mode: CombineMode,
        filters: Vec<ProjectFilter>,
    ) -> Result<Self, FilterError> {
        let combined = Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            none_value_should_pass: true,
            mode,
            filters,
        };
        if combined.depth() > MAX_DEPTH {
            return Err(FilterError::Config(format!(
                "combined filter '{id}' exceeds the maximum depth of {MAX_DEPTH}"
            )));
        }
        Ok(combined)
    }

    /// # Errors
    ///
    /// Any child configuration error, or excessive nesting.
    pub fn from_config(config: &CombinedFilterConfig) -> Result<Self, FilterError> {
        let filters = config
            .filters
            .iter()
            .map(ProjectFilter::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        let mut combined = Self::new(&config.id, &config.display_name, config.mode, filters)?;
        combined.none_value_should_pass = config.none_value_should_pass;
        Ok(combined)
    }

    /// Nesting level: 1 plus the deepest combined child.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.filters.iter().map(ProjectFilter::depth).max().unwrap_or(0)
    }

    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        FilterConfig::Combined(CombinedFilterConfig {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            none_value_should_pass: self.none_value_should_pass,
            filters: self.filters.iter().map(ProjectFilter::describe).collect(),
            mode: self.mode,
        })
    }

    /// OR stops at the first passing child; AND evaluates every child.
    pub fn evaluate<'a, S, C>(
        &'a self,
        env: FilterEnv<'a, S, C>,
        project: &'a ProjectData,
        context: &'a FilterContext,
    ) -> EvalFuture<'a>
    where
        S: ProjectStore + Sync,
        C: CompletionClient + Sync,
    {
        Box::pin(async move {
            let mut results = Vec::with_capacity(self.filters.len());
            for filter in &self.filters {
                let result = filter.evaluate(env, project, context).await?;
                let passed = result.passed;
                results.push(result);
                if self.mode == CombineMode::Or && passed {
                    break;
                }
            }
            let passed = match self.mode {
                CombineMode::Or => results.iter().any(|r| r.passed),
                CombineMode::And => !results.is_empty() && results.iter().all(|r| r.passed),
            };
            Ok(FilterResult::new(self.describe(), passed, Value::Null)
                .with_output(FilterOutput::Steps(results)))
        })
    }
}
