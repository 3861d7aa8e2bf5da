//! Filter primitives.
//!
//! Every filter maps `(ProjectData, context)` to a [`FilterResult`]. A "no"
//! is a result with `passed = false`, never an error; errors are reserved for
//! configuration problems and failed LLM calls.

mod combined;
mod gpt;
mod range;
mod regex;
mod tags;

pub use combined::{CombinedFilter, MAX_DEPTH};
pub use gpt::{GptFilter, parse_bool_response, placeholders, render};
pub use range::RangeFilter;
pub use self::regex::RegexFilter;
pub use tags::TagsFilter;

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::filters::{FilterConfig, FilterResult};
use dealflow_core::project::ProjectData;

use crate::context::{FilterContext, FilterEnv};
use crate::error::FilterError;

/// A configured filter of any kind.
#[derive(Debug, Clone)]
pub enum ProjectFilter {
    Range(RangeFilter),
    Regex(RegexFilter),
    Tags(TagsFilter),
    Gpt(GptFilter),
    Combined(CombinedFilter),
}

impl ProjectFilter {
    /// Build a filter from its serialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] for invalid settings and for
    /// `pipeline` configurations, which only describe results.
    pub fn from_config(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(match config {
            FilterConfig::Range(c) => Self::Range(RangeFilter::new(c.clone())?),
            FilterConfig::Regex(c) => Self::Regex(RegexFilter::new(c.clone())?),
            FilterConfig::Tags(c) => Self::Tags(TagsFilter::new(c.clone())),
            FilterConfig::Gpt(c) => Self::Gpt(GptFilter::new(c.clone())),
            FilterConfig::Combined(c) => Self::Combined(CombinedFilter::from_config(c)?),
            FilterConfig::Pipeline(c) => {
                return Err(FilterError::Config(format!(
                    "'{}' is a pipeline result, not a filter",
                    c.id
                )));
            }
        })
    }

    /// The configuration echoed into every result.
    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        match self {
            Self::Range(f) => f.describe(),
            Self::Regex(f) => f.describe(),
            Self::Tags(f) => f.describe(),
            Self::Gpt(f) => f.describe(),
            Self::Combined(f) => f.describe(),
        }
    }

    /// Combined-filter nesting; 0 for leaf filters.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Combined(f) => f.depth(),
            _ => 0,
        }
    }

    /// # Errors
    ///
    /// Only LLM gates can fail: missing prompt arguments, completion
    /// errors, unparsable answers.
    pub async fn evaluate<S, C>(
        &self,
        env: FilterEnv<'_, S, C>,
        project: &ProjectData,
        context: &FilterContext,
    ) -> Result<FilterResult, FilterError>
    where
        S: ProjectStore + Sync,
        C: CompletionClient + Sync,
    {
        match self {
            Self::Range(f) => Ok(f.evaluate(project)),
            Self::Regex(f) => Ok(f.evaluate(project)),
            Self::Tags(f) => Ok(f.evaluate(project, context)),
            Self::Gpt(f) => f.evaluate(env, project, context).await,
            Self::Combined(f) => f.evaluate(env, project, context).await,
        }
    }
}
