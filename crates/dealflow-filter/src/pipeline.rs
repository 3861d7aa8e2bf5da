//! Pipeline executor.
//!
//! Runs an ordered list of steps against one company. Preprocessor output
//! is merged into the context; filter results are appended to the trail and
//! the first failing filter stops the run.

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::filters::{FilterConfig, FilterOutput, FilterResult, PipelineConfig};
use dealflow_core::project::ProjectData;
use tracing::debug;

use crate::context::{FilterContext, FilterEnv};
use crate::error::{FilterError, PreconditionFailure};
use crate::filters::{MAX_DEPTH, ProjectFilter};
use crate::preprocess::Preprocessor;

/// One step of a pipeline.
#[derive(Debug, Clone)]
pub enum PipelineStep {
    Preprocess(Preprocessor),
    Filter(ProjectFilter),
}

impl From<Preprocessor> for PipelineStep {
    fn from(preprocessor: Preprocessor) -> Self {
        Self::Preprocess(preprocessor)
    }
}

impl From<ProjectFilter> for PipelineStep {
    fn from(filter: ProjectFilter) -> Self {
        Self::Filter(filter)
    }
}

/// A named, ordered list of steps.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub id: String,
    pub display_name: String,
    pub steps: Vec<PipelineStep>,
}

impl Pipeline {
    #[must_use]
    pub fn new(id: &str, display_name: &str, steps: Vec<PipelineStep>) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            steps,
        }
    }

    /// Synthetic configuration of the aggregate result.
    #[must_use]
    pub fn config(&self) -> FilterConfig {
        FilterConfig::Pipeline(PipelineConfig {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            none_value_should_pass: false,
        })
    }

    /// Reject combined filters nested deeper than [`MAX_DEPTH`].
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] naming the offending filter.
    pub fn validate(&self) -> Result<(), FilterError> {
        for step in &self.steps {
            if let PipelineStep::Filter(filter) = step {
                if filter.depth() > MAX_DEPTH {
                    return Err(FilterError::Config(format!(
                        "filter '{}' in pipeline '{}' exceeds the maximum depth of {MAX_DEPTH}",
                        filter.describe().id(),
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Result of a pipeline run that did not hit an unexpected error.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every step ran up to the first failing filter.
    Completed(FilterResult),
    /// A preprocessor could not produce its values; no verdict.
    PreconditionFailed(PreconditionFailure),
}

impl PipelineOutcome {
    #[must_use]
    pub const fn passed(&self) -> bool {
        match self {
            Self::Completed(result) => result.passed,
            Self::PreconditionFailed(_) => false,
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<&FilterResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::PreconditionFailed(_) => None,
        }
    }
}

/// Run `pipeline` against `project`.
///
/// `passed` is true only when at least one filter ran and none failed.
///
/// # Errors
///
/// Configuration errors, missing prompt arguments, store and completion
/// failures. Precondition failures are reported as
/// [`PipelineOutcome::PreconditionFailed`], never as an error.
pub async fn apply_filters<S, C>(
    env: FilterEnv<'_, S, C>,
    pipeline: &Pipeline,
    project: &ProjectData,
    context: FilterContext,
) -> Result<PipelineOutcome, FilterError>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
{
    pipeline.validate()?;

    let mut context = context;
    let mut trail: Vec<FilterResult> = Vec::new();
    let mut passed = false;

    for step in &pipeline.steps {
        match step {
            PipelineStep::Preprocess(preprocessor) => {
                match preprocessor.run(env, project, &context).await {
                    Ok(values) => context.merge(values),
                    Err(FilterError::Precondition(failure)) => {
                        debug!(pipeline = %pipeline.id, reason = %failure.reason, "precondition failed");
                        return Ok(PipelineOutcome::PreconditionFailed(failure));
                    }
                    Err(err) => return Err(err),
                }
            }
            PipelineStep::Filter(filter) => {
                let result = filter.evaluate(env, project, &context).await?;
                passed = result.passed;
                trail.push(result);
                if !passed {
                    break;
                }
            }
        }
    }

    debug!(pipeline = %pipeline.id, passed, steps = trail.len(), "pipeline finished");
    Ok(PipelineOutcome::Completed(
        FilterResult::new(pipeline.config(), passed, context.to_input(project))
            .with_output(FilterOutput::Steps(trail)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CombinedFilter, GptFilter, RangeFilter, RegexFilter};
    use crate::test_support::{StubCompletion, acme, test_service};
    use dealflow_core::enums::{CombineMode, MatchMode};
    use dealflow_core::project::ProjectField;
    use pretty_assertions::assert_eq;

    fn team_size() -> PipelineStep {
        ProjectFilter::Range(
            RangeFilter::bounded("team_size", "Team size", ProjectField::TeamSize, Some(2), Some(100))
                .unwrap(),
        )
        .into()
    }

    fn gate() -> PipelineStep {
        ProjectFilter::Gpt(GptFilter::from_prompt(
            "exclude_non_startups",
            "Exclude non-startups",
            "Is {company_name} a startup? {startup_data}",
            "m",
        ))
        .into()
    }

    #[tokio::test]
    async fn short_circuits_on_first_failure() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let pipeline = Pipeline::new(
            "p",
            "P",
            vec![Preprocessor::Description { min_len: 30 }.into(), team_size(), gate()],
        );
        let project = acme().with_team_size(500);

        let outcome = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &project,
            FilterContext::new(),
        )
        .await
        .unwrap();

        let result = outcome.result().unwrap();
        assert!(!result.passed);
        assert_eq!(result.steps().len(), 1);
        assert_eq!(completion.calls(), 0);
        assert_eq!(result.filter_config.filter_type(), "pipeline");
        assert!(!result.filter_config.none_value_should_pass());
        assert_eq!(result.input["company_name"], "Acme Robotics");
    }

    #[tokio::test]
    async fn passing_run_keeps_full_trail() {
        let (store, completion) = (test_service().await, StubCompletion::answering("True."));
        let pipeline = Pipeline::new(
            "p",
            "P",
            vec![Preprocessor::Description { min_len: 30 }.into(), team_size(), gate()],
        );

        let outcome = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &acme(),
            FilterContext::new(),
        )
        .await
        .unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.result().unwrap().steps().len(), 2);
        assert!(completion.prompts()[0].starts_with("Is Acme Robotics a startup?"));
    }

    #[tokio::test]
    async fn precondition_is_an_outcome() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let pipeline = Pipeline::new(
            "p",
            "P",
            vec![Preprocessor::Description { min_len: 30 }.into(), gate()],
        );
        let project = dealflow_core::project::ProjectData::default().with_title("Acme");

        let outcome = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &project,
            FilterContext::new(),
        )
        .await
        .unwrap();
        match outcome {
            PipelineOutcome::PreconditionFailed(failure) => {
                assert_eq!(failure.reason, "no valid description attributes found");
            }
            PipelineOutcome::Completed(result) => panic!("expected precondition, got {result:?}"),
        }
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn empty_pipeline_does_not_pass() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let pipeline = Pipeline::new("empty", "Empty", vec![]);
        let outcome = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &acme(),
            FilterContext::new(),
        )
        .await
        .unwrap();
        assert!(!outcome.passed());
    }

    #[tokio::test]
    async fn missing_prompt_args_is_an_error() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let pipeline = Pipeline::new("p", "P", vec![gate()]);
        let err = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &acme(),
            FilterContext::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FilterError::MissingPromptArgs { .. }));
    }

    #[tokio::test]
    async fn combined_step_records_child_trail() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let title = ProjectFilter::Regex(
            RegexFilter::terms("title", "Title", ProjectField::Title, &["consulting".into()], MatchMode::Exclude)
                .unwrap(),
        );
        let size = ProjectFilter::Range(
            RangeFilter::bounded("team_size", "Team size", ProjectField::TeamSize, Some(2), None).unwrap(),
        );
        let hard = CombinedFilter::new("hard_filters", "Hard filters", CombineMode::And, vec![title, size])
            .unwrap();
        let pipeline = Pipeline::new("p", "P", vec![ProjectFilter::Combined(hard).into()]);

        let outcome = apply_filters(
            FilterEnv::new(&store, &completion),
            &pipeline,
            &acme().with_title("Acme Consulting"),
            FilterContext::new(),
        )
        .await
        .unwrap();
        let result = outcome.result().unwrap();
        assert!(!result.passed);
        assert_eq!(result.steps()[0].steps().len(), 2);
        assert_eq!(result.first_failure().unwrap().filter_config.id(), "title");
    }
}
