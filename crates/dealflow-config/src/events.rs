//! Event trail configuration.

use serde::{Deserialize, Serialize};

fn default_trail_dir() -> String {
    ".dealflow/trail".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Directory holding one JSONL file per admission group.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            trail_dir: default_trail_dir(),
        }
    }
}
