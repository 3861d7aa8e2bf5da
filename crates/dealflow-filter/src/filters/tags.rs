use std::collections::BTreeSet;

use dealflow_core::enums::MatchMode;
use dealflow_core::filters::{FilterConfig, FilterResult, TagsFilterConfig};
use dealflow_core::project::{ProjectData, ProjectField};
use serde_json::Value;

use crate::context::FilterContext;

/// Set membership over a list field of the company or the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsFilter {
    config: TagsFilterConfig,
}

impl TagsFilter {
    #[must_use]
    pub const fn new(config: TagsFilterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        FilterConfig::Tags(self.config.clone())
    }

    fn values(&self, project: &ProjectData, context: &FilterContext) -> Option<Vec<String>> {
        ProjectField::from_name(&self.config.field_name)
            .and_then(|field| field.tags(project))
            .filter(|tags| !tags.is_empty())
            .map(<[String]>::to_vec)
            .or_else(|| context.get_tags(&self.config.field_name))
    }

    #[must_use]
    pub fn evaluate(&self, project: &ProjectData, context: &FilterContext) -> FilterResult {
        let tags = match self.values(project, context) {
            Some(tags) if !tags.is_empty() => tags,
            _ => {
                return FilterResult::new(
                    self.describe(),
                    self.config.none_value_should_pass,
                    Value::Null,
                );
            }
        };

        let wanted: BTreeSet<&str> = self.config.tags.iter().map(String::as_str).collect();
        let common = tags
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .intersection(&wanted)
            .count();
        let has_common = if self.config.require_all {
            common == wanted.len()
        } else {
            common > 0
        };
        let passed = match self.config.mode {
            MatchMode::Include => has_common,
            MatchMode::Exclude => !has_common,
        };
        FilterResult::new(self.describe(), passed, Value::from(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn industries(mode: MatchMode, require_all: bool) -> TagsFilter {
        TagsFilter::new(TagsFilterConfig {
            id: "b2b_tags".into(),
            display_name: "Industries (B2B)".into(),
            none_value_should_pass: false,
            field_name: "industries".into(),
            tags: vec!["TRANSPORTATION".into(), "ENERGY".into()],
            mode,
            require_all,
        })
    }

    fn with_industries(tags: &[&str]) -> ProjectData {
        let mut project = ProjectData::default();
        project.analytics.industries = Some(Some(tags.iter().map(ToString::to_string).collect()));
        project
    }

    #[test]
    fn any_overlap_passes_include() {
        let result = industries(MatchMode::Include, false)
            .evaluate(&with_industries(&["TRANSPORTATION", "SOFTWARE"]), &FilterContext::new());
        assert!(result.passed);
        assert_eq!(result.input, json!(["TRANSPORTATION", "SOFTWARE"]));
    }

    #[test]
    fn require_all_needs_every_tag() {
        let filter = industries(MatchMode::Include, true);
        let context = FilterContext::new();
        assert!(!filter.evaluate(&with_industries(&["TRANSPORTATION"]), &context).passed);
        assert!(filter.evaluate(&with_industries(&["ENERGY", "TRANSPORTATION"]), &context).passed);
    }

    #[test]
    fn exclude_inverts() {
        let filter = industries(MatchMode::Exclude, false);
        let context = FilterContext::new();
        assert!(!filter.evaluate(&with_industries(&["ENERGY"]), &context).passed);
        assert!(filter.evaluate(&with_industries(&["HEALTH CARE"]), &context).passed);
    }

    #[test]
    fn falls_back_to_context_value() {
        let mut context = FilterContext::new();
        context.insert("industries", json!(["ENERGY"]));
        let result = industries(MatchMode::Include, false).evaluate(&ProjectData::default(), &context);
        assert!(result.passed);
    }

    #[test]
    fn empty_list_follows_policy() {
        let result = industries(MatchMode::Include, false)
            .evaluate(&with_industries(&[]), &FilterContext::new());
        assert!(!result.passed);
        assert_eq!(result.input, Value::Null);
    }
}
