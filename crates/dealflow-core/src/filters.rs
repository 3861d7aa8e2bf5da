//! Serializable filter configuration and evaluation records.
//!
//! A [`FilterResult`] is the audit record of one filter evaluation. Pipelines
//! and combined filters nest the results of their children in `output`, so a
//! single result captures the whole evaluation tree.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{CombineMode, MatchMode};
use crate::project::ProjectField;

const fn default_true() -> bool {
    true
}

/// Configuration of one filter, tagged by `filter_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "filter_type", rename_all = "snake_case")]
pub enum FilterConfig {
    Pipeline(PipelineConfig),
    Gpt(GptFilterConfig),
    Range(RangeFilterConfig),
    Regex(RegexFilterConfig),
    Combined(CombinedFilterConfig),
    Tags(TagsFilterConfig),
}

impl FilterConfig {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Pipeline(c) => &c.id,
            Self::Gpt(c) => &c.id,
            Self::Range(c) => &c.id,
            Self::Regex(c) => &c.id,
            Self::Combined(c) => &c.id,
            Self::Tags(c) => &c.id,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pipeline(c) => &c.display_name,
            Self::Gpt(c) => &c.display_name,
            Self::Range(c) => &c.display_name,
            Self::Regex(c) => &c.display_name,
            Self::Combined(c) => &c.display_name,
            Self::Tags(c) => &c.display_name,
        }
    }

    #[must_use]
    pub const fn none_value_should_pass(&self) -> bool {
        match self {
            Self::Pipeline(c) => c.none_value_should_pass,
            Self::Gpt(c) => c.none_value_should_pass,
            Self::Range(c) => c.none_value_should_pass,
            Self::Regex(c) => c.none_value_should_pass,
            Self::Combined(c) => c.none_value_should_pass,
            Self::Tags(c) => c.none_value_should_pass,
        }
    }

    /// The `filter_type` discriminator.
    #[must_use]
    pub const fn filter_type(&self) -> &'static str {
        match self {
            Self::Pipeline(_) => "pipeline",
            Self::Gpt(_) => "gpt",
            Self::Range(_) => "range",
            Self::Regex(_) => "regex",
            Self::Combined(_) => "combined",
            Self::Tags(_) => "tags",
        }
    }
}

/// Synthetic configuration of an aggregate pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub none_value_should_pass: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GptFilterConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub none_value_should_pass: bool,
    pub prompt: String,
    pub model: String,
    pub required_kwargs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RangeFilterConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub none_value_should_pass: bool,
    pub field: ProjectField,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegexFilterConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub none_value_should_pass: bool,
    pub field: ProjectField,
    pub pattern: String,
    pub mode: MatchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedFilterConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub none_value_should_pass: bool,
    pub filters: Vec<FilterConfig>,
    pub mode: CombineMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TagsFilterConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub none_value_should_pass: bool,
    pub field_name: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub require_all: bool,
}

/// Output of a filter evaluation: nested child results or an extra value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterOutput {
    Steps(Vec<FilterResult>),
    Value(Value),
}

/// Immutable record of one filter evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilterResult {
    pub filter_config: FilterConfig,
    pub passed: bool,
    /// Echo of what the filter looked at.
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<FilterOutput>,
}

impl FilterResult {
    #[must_use]
    pub const fn new(filter_config: FilterConfig, passed: bool, input: Value) -> Self {
        Self {
            filter_config,
            passed,
            input,
            output: None,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: FilterOutput) -> Self {
        self.output = Some(output);
        self
    }

    /// Nested child results; empty for leaf filters.
    #[must_use]
    pub fn steps(&self) -> &[Self] {
        match &self.output {
            Some(FilterOutput::Steps(steps)) => steps,
            _ => &[],
        }
    }

    /// Extra value of a leaf filter (e.g. the groups a regex matched).
    #[must_use]
    pub const fn output_value(&self) -> Option<&Value> {
        match &self.output {
            Some(FilterOutput::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The first failing step, searched depth-first.
    #[must_use]
    pub fn first_failure(&self) -> Option<&Self> {
        self.steps().iter().find_map(|step| {
            if step.passed {
                None
            } else {
                Some(step.first_failure().unwrap_or(step))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn range(id: &str) -> FilterConfig {
        FilterConfig::Range(RangeFilterConfig {
            id: id.to_string(),
            display_name: "Team size".to_string(),
            none_value_should_pass: true,
            field: ProjectField::TeamSize,
            min_value: Some(2),
            max_value: Some(100),
        })
    }

    #[test]
    fn config_is_tagged_by_filter_type() {
        let value = serde_json::to_value(range("team_size")).unwrap();
        assert_eq!(value["filter_type"], "range");
        assert_eq!(value["min_value"], 2);

        let back: FilterConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back.id(), "team_size");
        assert_eq!(back.filter_type(), "range");
    }

    #[test]
    fn none_value_should_pass_defaults_to_true() {
        let config: FilterConfig = serde_json::from_value(json!({
            "filter_type": "regex",
            "id": "title",
            "display_name": "Title",
            "field": "title",
            "pattern": "consulting",
            "mode": "exclude"
        }))
        .unwrap();
        assert!(config.none_value_should_pass());
    }

    #[test]
    fn nested_results_expose_steps_and_first_failure() {
        let failing = FilterResult::new(range("founded_year"), false, json!(2010));
        let pipeline = FilterResult::new(
            FilterConfig::Pipeline(PipelineConfig {
                id: "filter_company_data".to_string(),
                display_name: "Filter company data".to_string(),
                none_value_should_pass: false,
            }),
            false,
            json!({}),
        )
        .with_output(FilterOutput::Steps(vec![
            FilterResult::new(range("team_size"), true, json!(12)),
            failing.clone(),
        ]));

        assert_eq!(pipeline.steps().len(), 2);
        assert_eq!(pipeline.first_failure(), Some(&failing));

        let json = serde_json::to_value(&pipeline).unwrap();
        let back: FilterResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, pipeline);
    }

    #[test]
    fn leaf_output_value_round_trips() {
        let result = FilterResult::new(range("title"), false, json!("Acme Consulting"))
            .with_output(FilterOutput::Value(json!(["consulting"])));
        let back: FilterResult =
            serde_json::from_value(serde_json::to_value(&result).unwrap()).unwrap();
        assert_eq!(back.output_value(), Some(&json!(["consulting"])));
    }
}
