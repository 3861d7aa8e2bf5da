use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A social or profile link shown on the public feed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SocialEntry {
    pub title: String,
    pub url: String,
    pub icon: String,
}

/// Public, client-facing feed record of a published company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FeedEntry {
    pub project_uuid: Uuid,
    pub title: String,
    pub website: String,
    pub logo: Option<String>,
    pub about: Option<String>,
    pub verticals: Vec<String>,
    pub socials: Vec<SocialEntry>,
    pub discovered_date: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}
