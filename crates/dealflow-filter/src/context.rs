//! Evaluation context shared by the steps of one pipeline run.

use std::collections::BTreeMap;

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::project::ProjectData;
use dealflow_core::signals::FundId;
use serde_json::{Map, Value};

/// Collaborators a pipeline run may call into.
///
/// Handles only; never serialized into results.
pub struct FilterEnv<'a, S, C> {
    pub store: &'a S,
    pub completion: &'a C,
}

impl<S, C> Clone for FilterEnv<'_, S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for FilterEnv<'_, S, C> {}

impl<'a, S, C> FilterEnv<'a, S, C>
where
    S: ProjectStore + Sync,
    C: CompletionClient + Sync,
{
    #[must_use]
    pub const fn new(store: &'a S, completion: &'a C) -> Self {
        Self { store, completion }
    }
}

/// Named values contributed by the caller and by preprocessors.
///
/// Keys follow the prompt placeholders (`startup_data`, `company_name`,
/// `fund_name`, `thesis`, `industries`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterContext {
    values: Map<String, Value>,
}

/// Context key holding the fund signal under evaluation.
pub const SIGNAL_KEY: &str = "signal";

impl FilterContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for evaluating one fund signal.
    #[must_use]
    pub fn for_signal(signal: FundId) -> Self {
        let mut context = Self::new();
        context.insert(
            SIGNAL_KEY,
            serde_json::json!({"entity_type": "fund", "id": signal.id}),
        );
        context
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Merge another context in; its values win.
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// String list stored under `key`, ignoring non-string items.
    #[must_use]
    pub fn get_tags(&self, key: &str) -> Option<Vec<String>> {
        let items = self.values.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    /// The fund signal this run evaluates, if any.
    #[must_use]
    pub fn signal(&self) -> Option<FundId> {
        let id = self.values.get(SIGNAL_KEY)?.get("id")?.as_i64()?;
        Some(FundId { id })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Prompt arguments: the company's fields overlaid with context values.
    ///
    /// Strings are used verbatim, lists comma-joined, other values as JSON.
    #[must_use]
    pub fn prompt_kwargs(&self, project: &ProjectData) -> BTreeMap<String, String> {
        let mut kwargs = project.prompt_kwargs();
        for (key, value) in &self.values {
            let rendered = match value {
                Value::Null => continue,
                Value::String(text) => text.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            kwargs.insert(key.clone(), rendered);
        }
        kwargs
    }

    /// JSON echo of the context with the company under `project_data`.
    #[must_use]
    pub fn to_input(&self, project: &ProjectData) -> Value {
        let mut values = Map::new();
        values.insert(
            "project_data".to_string(),
            serde_json::to_value(project).unwrap_or(Value::Null),
        );
        values.extend(self.values.clone());
        Value::Object(values)
    }
}

impl From<Map<String, Value>> for FilterContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn signal_round_trips_through_context() {
        let context = FilterContext::for_signal(FundId { id: 7 });
        assert_eq!(context.signal(), Some(FundId { id: 7 }));
        assert_eq!(FilterContext::new().signal(), None);
    }

    #[test]
    fn context_values_override_project_fields() {
        let project = ProjectData::default().with_title("Acme").with_team_size(12);
        let mut context = FilterContext::new();
        context.insert("title", json!("Acme Robotics"));
        context.insert("industries", json!(["TRANSPORTATION", "ENERGY"]));
        context.insert("fund_id", json!(3));

        let kwargs = context.prompt_kwargs(&project);
        assert_eq!(kwargs["title"], "Acme Robotics");
        assert_eq!(kwargs["team_size"], "12");
        assert_eq!(kwargs["industries"], "TRANSPORTATION, ENERGY");
        assert_eq!(kwargs["fund_id"], "3");
    }

    #[test]
    fn input_echo_nests_project_data() {
        let project = ProjectData::default().with_title("Acme");
        let mut context = FilterContext::new();
        context.insert("startup_data", json!("Robots"));

        assert_eq!(
            context.to_input(&project),
            json!({"project_data": {"title": "Acme"}, "startup_data": "Robots"})
        );
    }
}
