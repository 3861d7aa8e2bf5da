use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scraped LinkedIn company profile, optionally linked to a tracked company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedinProfile {
    pub id: i64,
    /// Normalized `https://www.linkedin.com/...` URL; unique.
    pub linkedin_url: String,
    pub linkedin_id: Option<i64>,
    pub title: Option<String>,
    pub website: Option<String>,
    pub tracked_project_id: Option<i64>,
    pub last_parsed: DateTime<Utc>,
}
