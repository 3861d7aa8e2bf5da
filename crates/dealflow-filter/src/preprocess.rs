//! Preprocessors: pipeline steps that derive context instead of judging.
//!
//! A preprocessor either contributes new context values or raises a
//! precondition failure, which aborts the pipeline without a verdict.

use std::collections::BTreeMap;

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::enums::TagAttr;
use dealflow_core::project::ProjectData;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::context::{FilterContext, FilterEnv};
use crate::error::{FilterError, PreconditionFailure};
use crate::filters::render;

/// Data source recorded on tags produced by the tagging prompt.
pub const LLM_TAG_SOURCE: &str = "llm";

/// Context-deriving pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preprocessor {
    /// Contributes `startup_data` and `company_name`.
    Description { min_len: usize },
    /// Contributes `fund_id`, `fund_name` and `thesis` for the signal's fund.
    Fund,
    /// Contributes `industries`, cached per company.
    Tags { prompt: String, model: String },
}

fn precondition(reason: impl Into<String>, inputs: Value) -> FilterError {
    FilterError::Precondition(PreconditionFailure::new(reason, inputs))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Preprocessor {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Description { .. } => "project_description",
            Self::Fund => "fund",
            Self::Tags { .. } => "project_tags",
        }
    }

    /// # Errors
    ///
    /// [`FilterError::Precondition`] when the step cannot produce its values;
    /// store and completion errors otherwise.
    pub async fn run<S, C>(
        &self,
        env: FilterEnv<'_, S, C>,
        project: &ProjectData,
        context: &FilterContext,
    ) -> Result<FilterContext, FilterError>
    where
        S: ProjectStore + Sync,
        C: CompletionClient + Sync,
    {
        debug!(preprocessor = self.name(), "running preprocessor");
        match self {
            Self::Description { min_len } => describe_project(project, context, *min_len),
            Self::Fund => resolve_fund(env, context).await,
            Self::Tags { prompt, model } => tag_project(env, project, context, prompt, model).await,
        }
    }
}

fn describe_project(
    project: &ProjectData,
    context: &FilterContext,
    min_len: usize,
) -> Result<FilterContext, FilterError> {
    let inputs = || context.to_input(project);

    let mut info = Vec::new();
    if let Some(location) = project.analytics.location.clone().flatten().filter(|l| !l.trim().is_empty()) {
        info.push(format!("location: {location}"));
    }
    if let Some(team_size) = project.analytics.team_size.flatten().filter(|size| *size != 0) {
        info.push(format!("team_size: {team_size}"));
    }

    let descriptions: Vec<String> = project
        .descriptive_fields()
        .into_iter()
        .flatten()
        .map(collapse_whitespace)
        .filter(|text| !text.is_empty())
        .collect();
    if descriptions.is_empty() {
        return Err(precondition("no valid description attributes found", inputs()));
    }

    let startup_data = format!("{}\n{}", info.join("\n"), descriptions.join("\n"));
    if startup_data.chars().count() < min_len {
        return Err(precondition("startup description is too short", inputs()));
    }

    let mut out = FilterContext::new();
    out.insert("startup_data", Value::String(startup_data));
    out.insert(
        "company_name",
        project.title().map_or(Value::Null, Value::from),
    );
    Ok(out)
}

async fn resolve_fund<S, C>(
    env: FilterEnv<'_, S, C>,
    context: &FilterContext,
) -> Result<FilterContext, FilterError>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
{
    let Some(signal) = context.signal() else {
        return Err(precondition(
            "pipeline has no fund signal",
            json!({"signal": context.get("signal")}),
        ));
    };

    let Some(fund) = env.store.get_fund(signal.id).await? else {
        return Err(precondition(
            format!("fund with id {} not found", signal.id),
            json!({"signal": {"entity_type": "fund", "id": signal.id}}),
        ));
    };

    let Some(thesis) = fund.thesis().map(str::to_string) else {
        return Err(precondition(
            format!("fund with id {} ({}) has no thesis", fund.id, fund.name),
            json!({
                "signal": {"entity_type": "fund", "id": signal.id},
                "fund_data": fund,
            }),
        ));
    };

    let mut out = FilterContext::new();
    out.insert("fund_id", Value::from(fund.id));
    out.insert("fund_name", Value::String(fund.name));
    out.insert("thesis", Value::String(thesis));
    Ok(out)
}

/// Expected shape of the tagging answer.
#[derive(Debug, Default, Deserialize)]
struct TaggingResponse {
    #[serde(default)]
    verticals: Vec<String>,
    #[serde(default)]
    industries: Vec<String>,
}

/// Parse the tagging answer, tolerating prose or code fences around the JSON.
fn parse_tagging_response(response: &str) -> Result<TaggingResponse, FilterError> {
    let start = response.find('{');
    let end = response.rfind('}');
    let body = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => {
            return Err(FilterError::ResponseParse(format!(
                "tagging response has no JSON object: {response:?}"
            )));
        }
    };
    serde_json::from_str(body)
        .map_err(|e| FilterError::ResponseParse(format!("tagging response is not valid JSON: {e}")))
}

fn dedup(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

async fn tag_project<S, C>(
    env: FilterEnv<'_, S, C>,
    project: &ProjectData,
    context: &FilterContext,
    prompt: &str,
    model: &str,
) -> Result<FilterContext, FilterError>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
{
    let tracked = match project.website() {
        Some(website) => env.store.find_project_by_website(website).await?,
        None => None,
    };

    if let Some(tracked) = &tracked {
        let cached = env
            .store
            .project_tags(tracked.id, TagAttr::Industries, LLM_TAG_SOURCE)
            .await?;
        if !cached.is_empty() {
            debug!(project_id = tracked.id, "using cached industry tags");
            let mut out = FilterContext::new();
            out.insert("industries", Value::from(cached));
            return Ok(out);
        }
    }

    let Some(startup_data) = context.get_str("startup_data") else {
        return Err(precondition(
            "industry tagging needs startup_data",
            context.to_input(project),
        ));
    };
    let kwargs = BTreeMap::from([("startup_data".to_string(), startup_data.to_string())]);
    let response = env.completion.complete(&render(prompt, &kwargs), model).await?;
    let tagged = parse_tagging_response(&response)?;
    let verticals = dedup(tagged.verticals);
    let industries = dedup(tagged.industries);

    match &tracked {
        Some(tracked) => {
            env.store
                .replace_project_tags(tracked.id, TagAttr::Verticals, &verticals, LLM_TAG_SOURCE)
                .await?;
            env.store
                .replace_project_tags(tracked.id, TagAttr::Industries, &industries, LLM_TAG_SOURCE)
                .await?;
        }
        None => warn!(website = ?project.website(), "tagged company is not tracked, tags not cached"),
    }

    let mut out = FilterContext::new();
    out.insert("industries", Value::from(industries));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubCompletion, acme, test_service};
    use dealflow_core::entities::ProjectCreate;
    use dealflow_core::enums::ProjectType;
    use dealflow_core::signals::FundId;
    use pretty_assertions::assert_eq;

    fn description() -> Preprocessor {
        Preprocessor::Description { min_len: 30 }
    }

    #[tokio::test]
    async fn description_concatenates_info_and_fields() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let project = acme().with_description("  Robots\n\n for   warehouses ");

        let out = description()
            .run(FilterEnv::new(&store, &completion), &project, &FilterContext::new())
            .await
            .unwrap();
        assert_eq!(
            out.get_str("startup_data"),
            Some(
                "location: Austin, Texas, USA\nteam_size: 12\n\
                 Acme builds autonomous warehouse robots for mid-size distributors.\n\
                 Robots for warehouses"
            )
        );
        assert_eq!(out.get_str("company_name"), Some("Acme Robotics"));
    }

    #[tokio::test]
    async fn description_requires_content() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let env = FilterEnv::new(&store, &completion);

        let empty = ProjectData::default().with_title("Acme").with_description("   ");
        let err = description().run(env, &empty, &FilterContext::new()).await.unwrap_err();
        match err {
            FilterError::Precondition(failure) => {
                assert_eq!(failure.reason, "no valid description attributes found");
                assert_eq!(failure.inputs["project_data"]["title"], "Acme");
            }
            other => panic!("unexpected error: {other}"),
        }

        let short = ProjectData::default().with_description("Robots");
        let err = description().run(env, &short, &FilterContext::new()).await.unwrap_err();
        assert!(
            matches!(err, FilterError::Precondition(ref f) if f.reason == "startup description is too short")
        );
    }

    #[tokio::test]
    async fn fund_preprocessor_resolves_thesis() {
        let (store, completion) = (test_service().await, StubCompletion::answering("true"));
        let fund = store.upsert_fund("Fund A", Some("Robotics")).await.unwrap();
        let bare = store.upsert_fund("Fund B", None).await.unwrap();
        let env = FilterEnv::new(&store, &completion);
        let project = acme();

        let out = Preprocessor::Fund
            .run(env, &project, &FilterContext::for_signal(FundId { id: fund.id }))
            .await
            .unwrap();
        assert_eq!(out.get_str("fund_name"), Some("Fund A"));
        assert_eq!(out.get_str("thesis"), Some("Robotics"));

        let err = Preprocessor::Fund
            .run(env, &project, &FilterContext::for_signal(FundId { id: bare.id }))
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::Precondition(ref f)
            if f.reason == format!("fund with id {} (Fund B) has no thesis", bare.id)));

        let err = Preprocessor::Fund
            .run(env, &project, &FilterContext::for_signal(FundId { id: 404 }))
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::Precondition(ref f) if f.reason == "fund with id 404 not found"));
    }

    #[tokio::test]
    async fn tags_are_fetched_once_and_cached() {
        let store = test_service().await;
        let completion = StubCompletion::answering(
            "```json\n{\"verticals\": [\"Robotics\", \"Robotics\"], \"industries\": [\"TRANSPORTATION\"]}\n```",
        );
        let project = acme();
        let create = ProjectCreate::validate(&project, ProjectType::Startup).unwrap();
        let (tracked, _) = store.find_or_create_project(&create).await.unwrap();

        let tags = Preprocessor::Tags {
            prompt: "Tag: {startup_data}".into(),
            model: "m".into(),
        };
        let mut context = FilterContext::new();
        context.insert("startup_data", Value::from("Robots for warehouses"));
        let env = FilterEnv::new(&store, &completion);

        let first = tags.run(env, &project, &context).await.unwrap();
        let second = tags.run(env, &project, &context).await.unwrap();

        assert_eq!(first.get_tags("industries"), Some(vec!["TRANSPORTATION".to_string()]));
        assert_eq!(first, second);
        assert_eq!(completion.calls(), 1);
        assert_eq!(completion.prompts(), vec!["Tag: Robots for warehouses".to_string()]);
        assert_eq!(
            store
                .project_tags(tracked.id, TagAttr::Verticals, LLM_TAG_SOURCE)
                .await
                .unwrap(),
            vec!["Robotics".to_string()]
        );
    }

    #[test]
    fn tagging_response_must_be_json() {
        assert!(matches!(
            parse_tagging_response("no idea"),
            Err(FilterError::ResponseParse(_))
        ));
    }
}
