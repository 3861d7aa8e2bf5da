use dealflow_core::filters::{FilterConfig, FilterResult, RangeFilterConfig};
use dealflow_core::project::{FieldKind, ProjectData, ProjectField};
use serde_json::Value;

use crate::error::FilterError;

/// Passes when a numeric field lies within `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    config: RangeFilterConfig,
}

impl RangeFilter {
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] when both bounds are absent or the
    /// field is not numeric.
    pub fn new(config: RangeFilterConfig) -> Result<Self, FilterError> {
        if config.min_value.is_none() && config.max_value.is_none() {
            return Err(FilterError::Config(format!(
                "range filter '{}' needs min_value or max_value",
                config.id
            )));
        }
        if config.field.kind() != FieldKind::Number {
            return Err(FilterError::Config(format!(
                "range filter '{}' reads non-numeric field '{}'",
                config.id,
                config.field.as_str()
            )));
        }
        Ok(Self { config })
    }

    /// Shorthand for the built-in pipelines.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn bounded(
        id: &str,
        display_name: &str,
        field: ProjectField,
        min_value: Option<i64>,
        max_value: Option<i64>,
    ) -> Result<Self, FilterError> {
        Self::new(RangeFilterConfig {
            id: id.to_string(),
            display_name: display_name.to_string(),
            none_value_should_pass: true,
            field,
            min_value,
            max_value,
        })
    }

    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        FilterConfig::Range(self.config.clone())
    }

    #[must_use]
    pub fn evaluate(&self, project: &ProjectData) -> FilterResult {
        let Some(value) = self.config.field.number(project) else {
            return FilterResult::new(self.describe(), self.config.none_value_should_pass, Value::Null);
        };
        let above_min = self.config.min_value.is_none_or(|min| value >= min);
        let below_max = self.config.max_value.is_none_or(|max| value <= max);
        FilterResult::new(self.describe(), above_min && below_max, Value::from(value))
    }
}
