//! Prompt templates and exclusion term lists used by the named pipelines.
//!
//! Every asset has a built-in default embedded at compile time. An
//! `assets_dir` may override any subset of them by file name.

use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

pub const EXCLUDED_TITLES: &str = "excluded_titles.txt";
pub const EXCLUDED_DESCRIPTIONS: &str = "excluded_descriptions.txt";
pub const IS_STARTUP_PROMPT: &str = "is_startup_prompt.txt";
pub const THESIS_MATCH_PROMPT: &str = "thesis_match_prompt.txt";
pub const MANUFACTURING_PROMPT: &str = "manufacturing_prompt.txt";
pub const IS_HAZMAT_PROMPT: &str = "is_hazmat_prompt.txt";
pub const INDUSTRY_TAGGING_PROMPT: &str = "industry_tagging_prompt.txt";

const BUILTIN: [(&str, &str); 7] = [
    (EXCLUDED_TITLES, include_str!("../assets/excluded_titles.txt")),
    (EXCLUDED_DESCRIPTIONS, include_str!("../assets/excluded_descriptions.txt")),
    (IS_STARTUP_PROMPT, include_str!("../assets/is_startup_prompt.txt")),
    (THESIS_MATCH_PROMPT, include_str!("../assets/thesis_match_prompt.txt")),
    (MANUFACTURING_PROMPT, include_str!("../assets/manufacturing_prompt.txt")),
    (IS_HAZMAT_PROMPT, include_str!("../assets/is_hazmat_prompt.txt")),
    (INDUSTRY_TAGGING_PROMPT, include_str!("../assets/industry_tagging_prompt.txt")),
];

/// Loaded filter assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterAssets {
    pub excluded_titles: Vec<String>,
    pub excluded_descriptions: Vec<String>,
    pub is_startup_prompt: String,
    pub thesis_match_prompt: String,
    pub manufacturing_prompt: String,
    pub is_hazmat_prompt: String,
    pub industry_tagging_prompt: String,
}

/// Split a term list: one term per line, blank lines and `#` comments skipped.
#[must_use]
pub fn parse_term_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn builtin(name: &str) -> &'static str {
    BUILTIN
        .iter()
        .find(|(file, _)| *file == name)
        .map_or("", |(_, text)| *text)
}

fn read(dir: Option<&Path>, name: &str) -> Result<String, ConfigError> {
    if let Some(dir) = dir {
        let path = dir.join(name);
        if path.is_file() {
            debug!(path = %path.display(), "loading filter asset override");
            return std::fs::read_to_string(&path).map_err(|source| ConfigError::Asset { path, source });
        }
    }
    Ok(builtin(name).to_string())
}

impl FilterAssets {
    /// Built-in defaults only.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            excluded_titles: parse_term_list(builtin(EXCLUDED_TITLES)),
            excluded_descriptions: parse_term_list(builtin(EXCLUDED_DESCRIPTIONS)),
            is_startup_prompt: builtin(IS_STARTUP_PROMPT).to_string(),
            thesis_match_prompt: builtin(THESIS_MATCH_PROMPT).to_string(),
            manufacturing_prompt: builtin(MANUFACTURING_PROMPT).to_string(),
            is_hazmat_prompt: builtin(IS_HAZMAT_PROMPT).to_string(),
            industry_tagging_prompt: builtin(INDUSTRY_TAGGING_PROMPT).to_string(),
        }
    }

    /// Load assets, preferring files in `dir` over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Asset`] if an override file exists but cannot be read.
    pub fn load(dir: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self {
            excluded_titles: parse_term_list(&read(dir, EXCLUDED_TITLES)?),
            excluded_descriptions: parse_term_list(&read(dir, EXCLUDED_DESCRIPTIONS)?),
            is_startup_prompt: read(dir, IS_STARTUP_PROMPT)?,
            thesis_match_prompt: read(dir, THESIS_MATCH_PROMPT)?,
            manufacturing_prompt: read(dir, MANUFACTURING_PROMPT)?,
            is_hazmat_prompt: read(dir, IS_HAZMAT_PROMPT)?,
            industry_tagging_prompt: read(dir, INDUSTRY_TAGGING_PROMPT)?,
        })
    }
}
