//! Normalized company data consumed by filters and admission.
//!
//! Every field of [`ProjectData`] distinguishes three states:
//!
//! - `None`: the key was absent (unset). Unset keys are not serialized.
//! - `Some(None)`: the key was present with an explicit `null`.
//! - `Some(Some(v))`: the key carried a value.
//!
//! Admission applies only the set keys of an update, so an explicit `null`
//! clears a stored value while an absent key leaves it untouched.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::InvestmentStage;
use crate::urls::normalize_website;

/// A tri-state field: unset, explicit null, or value.
pub type Patch<T> = Option<Option<T>>;

/// Deserialize a present key (null or value) as `Some(_)`.
///
/// Paired with `#[serde(default)]` so that an absent key stays `None`.
pub fn deserialize_patch<'de, D, T>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn deserialize_website<'de, D>(deserializer: D) -> Result<Patch<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|v| Some(v.map(|w| normalize_website(&w))))
}

fn deserialize_stage<'de, D>(deserializer: D) -> Result<Patch<InvestmentStage>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
        .map(|v| Some(v.and_then(|raw| InvestmentStage::parse_lenient(&raw))))
}

fn flat<T>(field: &Patch<T>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

fn flat_str(field: &Patch<String>) -> Option<&str> {
    flat(field).map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Partial analytics record attached to [`ProjectData`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalytics {
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub team_size: Patch<i64>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub founded: Patch<i64>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub location: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_stage", skip_serializing_if = "Option::is_none")]
    pub stage: Patch<InvestmentStage>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub funding: Patch<i64>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub last_round: Patch<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub last_round_amount: Patch<i64>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub previous_exit: Patch<bool>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub recent_investment: Patch<bool>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub industries: Patch<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub verticals: Patch<Vec<String>>,
}

impl ProjectAnalytics {
    /// True when no key is set.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Company data as it flows through filtering and admission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub title: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub description: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_website", skip_serializing_if = "Option::is_none")]
    pub website: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub logo: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub crunchbase_url: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub about: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub category: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub industry: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_patch", skip_serializing_if = "Option::is_none")]
    pub specialities: Patch<String>,
    #[serde(default, skip_serializing_if = "ProjectAnalytics::is_unset")]
    pub analytics: ProjectAnalytics,
}

impl ProjectData {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    #[must_use]
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(Some(about.into()));
        self
    }

    /// Set the website, normalizing it the same way deserialization does.
    #[must_use]
    pub fn with_website(mut self, website: &str) -> Self {
        self.website = Some(Some(normalize_website(website)));
        self
    }

    #[must_use]
    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(Some(logo.into()));
        self
    }

    #[must_use]
    pub const fn with_team_size(mut self, team_size: i64) -> Self {
        self.analytics.team_size = Some(Some(team_size));
        self
    }

    #[must_use]
    pub const fn with_founded(mut self, founded: i64) -> Self {
        self.analytics.founded = Some(Some(founded));
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.analytics.location = Some(Some(location.into()));
        self
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        flat_str(&self.title)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        flat_str(&self.description)
    }

    #[must_use]
    pub fn website(&self) -> Option<&str> {
        flat_str(&self.website)
    }

    #[must_use]
    pub fn logo(&self) -> Option<&str> {
        flat_str(&self.logo)
    }

    #[must_use]
    pub fn crunchbase_url(&self) -> Option<&str> {
        flat_str(&self.crunchbase_url)
    }

    #[must_use]
    pub fn about(&self) -> Option<&str> {
        flat_str(&self.about)
    }

    /// Descriptive text fields in the order the description preprocessor reads them.
    #[must_use]
    pub fn descriptive_fields(&self) -> [Option<&str>; 5] {
        [
            flat_str(&self.about),
            flat_str(&self.description),
            flat_str(&self.category),
            flat_str(&self.industry),
            flat_str(&self.specialities),
        ]
    }

    /// All set, non-null fields flattened into prompt arguments.
    ///
    /// Analytics values are included under their own names (`team_size`,
    /// `location`, ...), list values are comma-joined.
    #[must_use]
    pub fn prompt_kwargs(&self) -> BTreeMap<String, String> {
        let mut kwargs = BTreeMap::new();
        let text_fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("website", &self.website),
            ("logo", &self.logo),
            ("crunchbase_url", &self.crunchbase_url),
            ("about", &self.about),
            ("category", &self.category),
            ("industry", &self.industry),
            ("specialities", &self.specialities),
            ("location", &self.analytics.location),
        ];
        for (name, value) in text_fields {
            if let Some(value) = flat(value) {
                kwargs.insert(name.to_string(), value.clone());
            }
        }
        for field in ProjectField::ALL {
            if let Some(number) = field.number(self) {
                kwargs.insert(field.as_str().to_string(), number.to_string());
            }
            if let Some(tags) = field.tags(self) {
                kwargs.insert(field.as_str().to_string(), tags.join(", "));
            }
        }
        if let Some(stage) = flat(&self.analytics.stage) {
            kwargs.insert("stage".to_string(), stage.to_string());
        }
        kwargs
    }
}

/// Shape of the value a [`ProjectField`] extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Tags,
}

/// Closed set of extractors filters can read from [`ProjectData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Title,
    Description,
    About,
    Website,
    Location,
    Stage,
    TeamSize,
    Founded,
    Funding,
    LastRoundAmount,
    Industries,
    Verticals,
}

impl ProjectField {
    pub const ALL: [Self; 12] = [
        Self::Title,
        Self::Description,
        Self::About,
        Self::Website,
        Self::Location,
        Self::Stage,
        Self::TeamSize,
        Self::Founded,
        Self::Funding,
        Self::LastRoundAmount,
        Self::Industries,
        Self::Verticals,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::About => "about",
            Self::Website => "website",
            Self::Location => "location",
            Self::Stage => "stage",
            Self::TeamSize => "team_size",
            Self::Founded => "founded",
            Self::Funding => "funding",
            Self::LastRoundAmount => "last_round_amount",
            Self::Industries => "industries",
            Self::Verticals => "verticals",
        }
    }

    /// Look up a field by its serialized name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Title
            | Self::Description
            | Self::About
            | Self::Website
            | Self::Location
            | Self::Stage => FieldKind::Text,
            Self::TeamSize | Self::Founded | Self::Funding | Self::LastRoundAmount => {
                FieldKind::Number
            }
            Self::Industries | Self::Verticals => FieldKind::Tags,
        }
    }

    /// Text value of a text field; `None` for absent, null, blank or non-text fields.
    #[must_use]
    pub fn text(self, project: &ProjectData) -> Option<String> {
        match self {
            Self::Title => project.title().map(str::to_string),
            Self::Description => project.description().map(str::to_string),
            Self::About => project.about().map(str::to_string),
            Self::Website => project.website().map(str::to_string),
            Self::Location => flat_str(&project.analytics.location).map(str::to_string),
            Self::Stage => flat(&project.analytics.stage).map(ToString::to_string),
            _ => None,
        }
    }

    /// Numeric value of a number field.
    #[must_use]
    pub fn number(self, project: &ProjectData) -> Option<i64> {
        let analytics = &project.analytics;
        match self {
            Self::TeamSize => flat(&analytics.team_size).copied(),
            Self::Founded => flat(&analytics.founded).copied(),
            Self::Funding => flat(&analytics.funding).copied(),
            Self::LastRoundAmount => flat(&analytics.last_round_amount).copied(),
            _ => None,
        }
    }

    /// List value of a tags field.
    #[must_use]
    pub fn tags(self, project: &ProjectData) -> Option<&[String]> {
        let analytics = &project.analytics;
        match self {
            Self::Industries => flat(&analytics.industries).map(Vec::as_slice),
            Self::Verticals => flat(&analytics.verticals).map(Vec::as_slice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tri_state_survives_round_trip() {
        let data: ProjectData = serde_json::from_value(json!({
            "title": "Acme Robotics",
            "logo": null,
            "analytics": {"team_size": 12}
        }))
        .unwrap();

        assert_eq!(data.title, Some(Some("Acme Robotics".to_string())));
        assert_eq!(data.logo, Some(None));
        assert_eq!(data.description, None);

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(
            back,
            json!({
                "title": "Acme Robotics",
                "logo": null,
                "analytics": {"team_size": 12}
            })
        );
    }

    #[test]
    fn website_is_normalized_on_deserialize() {
        let data: ProjectData =
            serde_json::from_value(json!({"website": "HTTP://www.Acme.com/?utm=1"})).unwrap();
        assert_eq!(data.website(), Some("https://acme.com"));
    }

    #[test]
    fn unparsable_stage_becomes_null() {
        let data: ProjectData =
            serde_json::from_value(json!({"analytics": {"stage": "Series A"}})).unwrap();
        assert_eq!(data.analytics.stage, Some(Some(InvestmentStage::SeriesA)));

        let data: ProjectData =
            serde_json::from_value(json!({"analytics": {"stage": "growth"}})).unwrap();
        assert_eq!(data.analytics.stage, Some(None));
    }

    #[test]
    fn field_extractors_respect_kind() {
        let data = ProjectData::default()
            .with_title("Acme")
            .with_team_size(12)
            .with_location("Austin, USA");

        assert_eq!(ProjectField::Title.text(&data).as_deref(), Some("Acme"));
        assert_eq!(ProjectField::TeamSize.number(&data), Some(12));
        assert_eq!(ProjectField::TeamSize.text(&data), None);
        assert_eq!(ProjectField::Founded.number(&data), None);
        assert_eq!(ProjectField::Location.kind(), FieldKind::Text);
        assert_eq!(ProjectField::from_name("team_size"), Some(ProjectField::TeamSize));
        assert_eq!(ProjectField::from_name("thesis"), None);
    }

    #[test]
    fn blank_text_reads_as_absent() {
        let data = ProjectData::default().with_description("   ");
        assert_eq!(data.description(), None);
    }

    #[test]
    fn prompt_kwargs_flatten_set_fields() {
        let data = ProjectData::default()
            .with_title("Acme")
            .with_team_size(12)
            .with_location("Austin");
        let kwargs = data.prompt_kwargs();

        assert_eq!(kwargs.get("title").map(String::as_str), Some("Acme"));
        assert_eq!(kwargs.get("team_size").map(String::as_str), Some("12"));
        assert_eq!(kwargs.get("location").map(String::as_str), Some("Austin"));
        assert!(!kwargs.contains_key("description"));
    }
}
