//! LLM yes/no gate.
//!
//! The prompt template uses `{name}` placeholders. Placeholder names are the
//! filter's required arguments; each is filled from the company's fields or
//! the evaluation context. Other braces (e.g. JSON examples) are left as is.

use std::collections::BTreeMap;

use dealflow_core::capabilities::{CompletionClient, ProjectStore};
use dealflow_core::filters::{FilterConfig, FilterResult, GptFilterConfig};
use dealflow_core::project::ProjectData;
use serde_json::Value;
use tracing::debug;

use crate::context::{FilterContext, FilterEnv};
use crate::error::FilterError;

/// Byte spans of `{name}` placeholders, braces included.
fn placeholder_spans(template: &str) -> Vec<(usize, usize)> {
    let bytes = template.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let mut j = i + 1;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j] == b'}' {
                spans.push((i, j + 1));
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

/// Placeholder names in order of first appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (start, end) in placeholder_spans(template) {
        let name = &template[start + 1..end - 1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Fill the placeholders present in `kwargs`, in a single pass.
#[must_use]
pub fn render(template: &str, kwargs: &BTreeMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for (start, end) in placeholder_spans(template) {
        rendered.push_str(&template[last..start]);
        match kwargs.get(&template[start + 1..end - 1]) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&template[start..end]),
        }
        last = end;
    }
    rendered.push_str(&template[last..]);
    rendered
}

/// Parse a strict boolean answer.
///
/// Case-insensitive, ignoring surrounding whitespace, dots and quotes.
///
/// # Errors
///
/// Returns [`FilterError::ResponseParse`] for anything but true/false.
pub fn parse_bool_response(response: &str) -> Result<bool, FilterError> {
    let answer = response
        .trim()
        .trim_matches(|c: char| c == '.' || c == '"' || c == '\'' || c.is_whitespace())
        .to_ascii_lowercase();
    match answer.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FilterError::ResponseParse(format!(
            "expected true or false, got {response:?}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GptFilter {
    config: GptFilterConfig,
}

impl GptFilter {
    #[must_use]
    pub const fn new(config: GptFilterConfig) -> Self {
        Self { config }
    }

    /// Gate whose required arguments are the template's own placeholders.
    #[must_use]
    pub fn from_prompt(id: &str, display_name: &str, prompt: &str, model: &str) -> Self {
        Self::new(GptFilterConfig {
            id: id.to_string(),
            display_name: display_name.to_string(),
            none_value_should_pass: true,
            prompt: prompt.to_string(),
            model: model.to_string(),
            required_kwargs: placeholders(prompt),
        })
    }

    #[must_use]
    pub fn describe(&self) -> FilterConfig {
        FilterConfig::Gpt(self.config.clone())
    }

    /// Render the prompt for a company.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::MissingPromptArgs`] when a required argument
    /// is neither a company field nor a context value.
    pub fn prompt(&self, project: &ProjectData, context: &FilterContext) -> Result<String, FilterError> {
        let kwargs = context.prompt_kwargs(project);
        let missing: Vec<String> = self
            .config
            .required_kwargs
            .iter()
            .filter(|name| !kwargs.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(FilterError::MissingPromptArgs {
                filter_id: self.config.id.clone(),
                missing,
            });
        }
        Ok(render(&self.config.prompt, &kwargs))
    }

    /// # Errors
    ///
    /// Missing prompt arguments, completion failures and unparsable answers.
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
        let prompt = self.prompt(project, context)?;
        let response = env.completion.complete(&prompt, &self.config.model).await?;
        let passed = parse_bool_response(&response)?;
        debug!(filter = %self.config.id, passed, "llm gate answered");
        Ok(FilterResult::new(self.describe(), passed, Value::String(prompt)))
    }
}
