//! Filter pipeline configuration.

use serde::{Deserialize, Serialize};

/// Minimum length of the concatenated company description.
const fn default_min_description_len() -> usize {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FiltersConfig {
    /// Directory with asset overrides. Files missing there fall back to the
    /// built-in defaults.
    #[serde(default)]
    pub assets_dir: Option<String>,

    #[serde(default = "default_min_description_len")]
    pub min_description_len: usize,

    /// Industries a b2b company must be tagged with. Empty disables tagging.
    #[serde(default)]
    pub b2b_industries: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            assets_dir: None,
            min_description_len: default_min_description_len(),
            b2b_industries: Vec::new(),
        }
    }
}
