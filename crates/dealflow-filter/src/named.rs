//! The pipelines admission runs, built from loaded filter assets.

use std::fmt;
use std::str::FromStr;

use dealflow_config::FilterAssets;
use dealflow_core::enums::MatchMode;
use dealflow_core::filters::{RegexFilterConfig, TagsFilterConfig};
use dealflow_core::project::ProjectField;

use crate::error::FilterError;
use crate::filters::{GptFilter, ProjectFilter, RangeFilter, RegexFilter, TagsFilter};
use crate::pipeline::{Pipeline, PipelineStep};
use crate::preprocess::Preprocessor;

/// Identifier of a named pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineName {
    Company,
    IsStartup,
    Signal,
    B2bCompany,
    B2bSignal,
}

impl PipelineName {
    pub const ALL: [Self; 5] = [
        Self::Company,
        Self::IsStartup,
        Self::Signal,
        Self::B2bCompany,
        Self::B2bSignal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "filter_company",
            Self::IsStartup => "filter_is_startup",
            Self::Signal => "filter_signal",
            Self::B2bCompany => "filter_b2b_company",
            Self::B2bSignal => "filter_b2b_signal",
        }
    }

    /// Whether the pipeline needs a fund signal in its context.
    #[must_use]
    pub const fn needs_signal(self) -> bool {
        matches!(self, Self::Signal | Self::B2bSignal)
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineName {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| FilterError::Config(format!("unknown pipeline '{s}'")))
    }
}

/// The five pipelines, built once per process.
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub company: Pipeline,
    pub is_startup: Pipeline,
    pub signal: Pipeline,
    pub b2b_company: Pipeline,
    pub b2b_signal: Pipeline,
}

impl Pipelines {
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] if a term list yields an invalid regex.
    /// Empty term lists leave their exclusion step out.
    pub fn from_assets(
        assets: &FilterAssets,
        min_description_len: usize,
        model: &str,
    ) -> Result<Self, FilterError> {
        let description = || Preprocessor::Description {
            min_len: min_description_len,
        };
        // An empty override leaves the title step out rather than excluding everything.
        let title_exclusion = || -> Result<Option<PipelineStep>, FilterError> {
            if assets.excluded_titles.is_empty() {
                return Ok(None);
            }
            let filter = RegexFilter::terms(
                "title",
                "Title",
                ProjectField::Title,
                &assets.excluded_titles,
                MatchMode::Exclude,
            )?;
            Ok(Some(ProjectFilter::Regex(filter).into()))
        };

        let mut company = Vec::new();
        company.extend(title_exclusion()?);
        if !assets.excluded_descriptions.is_empty() {
            company.push(
                ProjectFilter::Regex(RegexFilter::terms(
                    "description",
                    "Description",
                    ProjectField::Description,
                    &assets.excluded_descriptions,
                    MatchMode::Exclude,
                )?)
                .into(),
            );
        }
        company.push(range("team_size", "Team size", ProjectField::TeamSize, Some(2), Some(100))?);
        company.push(range("founded_year", "Founded year", ProjectField::Founded, Some(2016), None)?);

        let is_startup = vec![
            description().into(),
            gate("exclude_non_startups", "Exclude non-startups", &assets.is_startup_prompt, model),
        ];

        let signal = vec![
            description().into(),
            Preprocessor::Fund.into(),
            gate("thesis_matching", "Thesis matching", &assets.thesis_match_prompt, model),
        ];

        let b2b_steps = || -> Result<Vec<PipelineStep>, FilterError> {
            let mut steps: Vec<PipelineStep> = vec![description().into()];
            steps.extend(title_exclusion()?);
            steps.extend([
                range("b2b_team_size", "Team size (B2B)", ProjectField::TeamSize, Some(5), Some(5000))?,
                ProjectFilter::Regex(RegexFilter::new(RegexFilterConfig {
                    id: "is_location_usa".to_string(),
                    display_name: "Is location USA".to_string(),
                    none_value_should_pass: false,
                    field: ProjectField::Location,
                    pattern: r"\b(USA?|united states)\b".to_string(),
                    mode: MatchMode::Include,
                })?)
                .into(),
                gate("is_manufacturing", "Is manufacturing", &assets.manufacturing_prompt, model),
                gate("is_hazmat", "Is HAZMAT", &assets.is_hazmat_prompt, model),
            ]);
            Ok(steps)
        };

        Ok(Self {
            company: Pipeline::new("filter_company_data", "Filter company data", company),
            is_startup: Pipeline::new("filter_is_startup", "Filter is startup", is_startup),
            signal: Pipeline::new("filter_signal_valid", "Filter signal valid", signal),
            b2b_company: Pipeline::new(
                "filter_competitors_company_data",
                "Filter competitors company data",
                b2b_steps()?,
            ),
            b2b_signal: Pipeline::new("filter_b2b_signal_valid", "Filter B2B signal valid", b2b_steps()?),
        })
    }

    /// Tag each company's industries and require one of `industries` in both
    /// b2b pipelines. An empty list leaves the pipelines unchanged.
    #[must_use]
    pub fn with_b2b_industries(mut self, industries: &[String], prompt: &str, model: &str) -> Self {
        if industries.is_empty() {
            return self;
        }
        let tagging = Preprocessor::Tags {
            prompt: prompt.to_string(),
            model: model.to_string(),
        };
        let gate = TagsFilter::new(TagsFilterConfig {
            id: "b2b_tags".to_string(),
            display_name: "Industries (B2B)".to_string(),
            none_value_should_pass: false,
            field_name: "industries".to_string(),
            tags: industries.to_vec(),
            mode: MatchMode::Include,
            require_all: false,
        });
        for pipeline in [&mut self.b2b_company, &mut self.b2b_signal] {
            pipeline.steps.push(tagging.clone().into());
            pipeline.steps.push(ProjectFilter::Tags(gate.clone()).into());
        }
        self
    }

    #[must_use]
    pub const fn get(&self, name: PipelineName) -> &Pipeline {
        match name {
            PipelineName::Company => &self.company,
            PipelineName::IsStartup => &self.is_startup,
            PipelineName::Signal => &self.signal,
            PipelineName::B2bCompany => &self.b2b_company,
            PipelineName::B2bSignal => &self.b2b_signal,
        }
    }
}

fn range(
    id: &str,
    display_name: &str,
    field: ProjectField,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<PipelineStep, FilterError> {
    Ok(ProjectFilter::Range(RangeFilter::bounded(id, display_name, field, min, max)?).into())
}

fn gate(id: &str, display_name: &str, prompt: &str, model: &str) -> PipelineStep {
    ProjectFilter::Gpt(GptFilter::from_prompt(id, display_name, prompt, model)).into()
}
