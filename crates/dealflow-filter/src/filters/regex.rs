use dealflow_core::enums::MatchMode;
use dealflow_core::filters::{FilterConfig, FilterOutput, FilterResult, RegexFilterConfig};
use dealflow_core::project::{FieldKind, ProjectData, ProjectField};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::FilterError;

/// Case-insensitive search over a text field.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    config: RegexFilterConfig,
    regex: Regex,
}

impl RegexFilter {
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] for an invalid pattern or a
    /// non-text field.
    pub fn new(config: RegexFilterConfig) -> Result<Self, FilterError> {
        if config.field.kind() != FieldKind::Text {
            return Err(FilterError::Config(format!(
                "regex filter '{}' reads non-text field '{}'",
                config.id,
                config.field.as_str()
            )));
        }
        let regex = RegexBuilder::new(&config.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                FilterError::Config(format!("regex filter '{}' has invalid pattern: {e}", config.id))
            })?;
        Ok(Self { config, regex })
    }

    /// Word-boundary alternation of `terms`, e.g. `\b(consulting|agency)\b`.
    /// Each term is a regex alternative, not a literal.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] for an empty term list, since `\b()\b`
    /// matches every text. Otherwise see [`Self::new`].
    pub fn terms(
        id: &str,
        display_name: &str,
        field: ProjectField,
        terms: &[String],
        mode: MatchMode,
    ) -> Result<Self, FilterError> {
        if terms.is_empty() {
            return Err(FilterError::Config(format!("regex filter '{id}' has no terms")));
        }
        Self::new(RegexFilterConfig {
            id: id.to_string(),
            display_name: display_name.to_string(),
            none_value_should_pass: true,
            field,
            pattern: format!(r"\b({})\b", terms.join("|")),
            mode,
        })
    }

    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        FilterConfig::Regex(self.config.clone())
    }

    #[must_use]
    pub fn evaluate(&self, project: &ProjectData) -> FilterResult {
        let Some(text) = self.config.field.text(project) else {
            return FilterResult::new(self.describe(), self.config.none_value_should_pass, Value::Null);
        };
        let captures = self.regex.captures(&text);
        let input = Value::String(text.clone());

        match (self.config.mode, captures) {
            (MatchMode::Include, found) => FilterResult::new(self.describe(), found.is_some(), input),
            (MatchMode::Exclude, None) => FilterResult::new(self.describe(), true, input),
            (MatchMode::Exclude, Some(captures)) => {
                let matched: Vec<Value> = if captures.len() > 1 {
                    captures
                        .iter()
                        .skip(1)
                        .map(|group| group.map_or(Value::Null, |m| Value::from(m.as_str())))
                        .collect()
                } else {
                    captures
                        .get(0)
                        .map(|m| vec![Value::from(m.as_str())])
                        .unwrap_or_default()
                };
                FilterResult::new(self.describe(), false, input)
                    .with_output(FilterOutput::Value(Value::Array(matched)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn title_exclusion() -> RegexFilter {
        let terms = vec!["consulting".to_string(), "agency".to_string()];
        RegexFilter::terms("title", "Title", ProjectField::Title, &terms, MatchMode::Exclude).unwrap()
    }

    #[test]
    fn exclude_reports_matched_group() {
        let project = ProjectData::default().with_title("Acme Consulting LLC");
        let result = title_exclusion().evaluate(&project);

        assert!(!result.passed);
        assert_eq!(result.input, json!("Acme Consulting LLC"));
        let matched = result.output_value().unwrap().as_array().unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].as_str().unwrap().to_lowercase(), "consulting");
    }

    #[test]
    fn exclude_passes_without_match() {
        let project = ProjectData::default().with_title("Acme Robotics");
        let result = title_exclusion().evaluate(&project);
        assert!(result.passed);
        assert!(result.output.is_none());
    }

    #[test]
    fn whole_match_without_groups() {
        let filter = RegexFilter::new(RegexFilterConfig {
            id: "llc".into(),
            display_name: "LLC".into(),
            none_value_should_pass: true,
            field: ProjectField::Title,
            pattern: r"\bllc\b".into(),
            mode: MatchMode::Exclude,
        })
        .unwrap();
        let result = filter.evaluate(&ProjectData::default().with_title("Acme LLC"));
        assert_eq!(result.output_value(), Some(&json!(["LLC"])));
    }

    #[test]
    fn include_with_strict_policy() {
        let filter = RegexFilter::new(RegexFilterConfig {
            id: "is_location_usa".into(),
            display_name: "Is location USA".into(),
            none_value_should_pass: false,
            field: ProjectField::Location,
            pattern: "USA?|united states".into(),
            mode: MatchMode::Include,
        })
        .unwrap();

        assert!(filter.evaluate(&ProjectData::default().with_location("Austin, Texas, US")).passed);
        assert!(filter.evaluate(&ProjectData::default().with_location("Boston, United States")).passed);
        assert!(!filter.evaluate(&ProjectData::default().with_location("Berlin, Germany")).passed);
        assert!(!filter.evaluate(&ProjectData::default()).passed);
    }

    #[test]
    fn empty_term_list_is_config_error() {
        let err = RegexFilter::terms("title", "Title", ProjectField::Title, &[], MatchMode::Exclude)
            .unwrap_err();
        assert!(matches!(err, FilterError::Config(msg) if msg.contains("no terms")));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = RegexFilter::new(RegexFilterConfig {
            id: "broken".into(),
            display_name: "Broken".into(),
            none_value_should_pass: true,
            field: ProjectField::Title,
            pattern: "(unclosed".into(),
            mode: MatchMode::Include,
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }
}
