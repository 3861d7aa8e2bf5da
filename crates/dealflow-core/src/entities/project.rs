use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{InvestmentStage, ProductLine, ProjectStatus, ProjectType};
use crate::project::{Patch, ProjectAnalytics, ProjectData};
use crate::urls::{is_valid_website, normalize_website};

/// Stored analytics of a tracked company.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Analytics {
    pub team_size: Option<i64>,
    pub founded: Option<i64>,
    pub location: Option<String>,
    pub stage: Option<InvestmentStage>,
    pub funding: Option<i64>,
    pub last_round: Option<NaiveDate>,
    pub last_round_amount: Option<i64>,
    pub previous_exit: Option<bool>,
    pub recent_investment: Option<bool>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub verticals: Vec<String>,
}

fn apply<T: Clone>(target: &mut Option<T>, patch: &Patch<T>) {
    if let Some(value) = patch {
        target.clone_from(value);
    }
}

impl Analytics {
    /// Apply the set keys of a patch; explicit nulls clear.
    pub fn apply(&mut self, patch: &ProjectAnalytics) {
        apply(&mut self.team_size, &patch.team_size);
        apply(&mut self.founded, &patch.founded);
        apply(&mut self.location, &patch.location);
        apply(&mut self.stage, &patch.stage);
        apply(&mut self.funding, &patch.funding);
        apply(&mut self.last_round, &patch.last_round);
        apply(&mut self.last_round_amount, &patch.last_round_amount);
        apply(&mut self.previous_exit, &patch.previous_exit);
        apply(&mut self.recent_investment, &patch.recent_investment);
        if let Some(industries) = &patch.industries {
            self.industries = industries.clone().unwrap_or_default();
        }
        if let Some(verticals) = &patch.verticals {
            self.verticals = verticals.clone().unwrap_or_default();
        }
    }
}

/// A company tracked by the deal-flow pipeline, keyed by normalized website.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TrackedProject {
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub about: Option<String>,
    pub logo: Option<String>,
    pub crunchbase_url: Option<String>,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    /// Tri-state: `None` means not yet classified; `Some(false)` is sticky.
    pub is_startup: Option<bool>,
    pub is_b2b: Option<bool>,
    pub analytics: Analytics,
    pub discovered_date: Option<DateTime<Utc>>,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedProject {
    /// Classification flag for a product line.
    #[must_use]
    pub const fn classification(&self, line: ProductLine) -> Option<bool> {
        match line {
            ProductLine::Startup => self.is_startup,
            ProductLine::B2b => self.is_b2b,
        }
    }

    pub const fn set_classification(&mut self, line: ProductLine, value: bool) {
        match line {
            ProductLine::Startup => self.is_startup = Some(value),
            ProductLine::B2b => self.is_b2b = Some(value),
        }
    }

    /// Refresh detail fields from the set keys of `data`.
    ///
    /// The website is the identity key and never changes here. A blank or
    /// null title is ignored; other explicit nulls clear the stored value.
    pub fn apply_update(&mut self, data: &ProjectData) {
        if let Some(title) = data.title() {
            title.trim().clone_into(&mut self.title);
        }
        apply(&mut self.description, &data.description);
        apply(&mut self.about, &data.about);
        apply(&mut self.logo, &data.logo);
        if self.crunchbase_url.is_none() {
            apply(&mut self.crunchbase_url, &data.crunchbase_url);
        }
        self.analytics.apply(&data.analytics);
    }
}

/// One field-level validation problem.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Validated payload for creating a tracked company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectCreate {
    pub title: String,
    pub website: String,
    pub project_type: ProjectType,
    pub description: Option<String>,
    pub about: Option<String>,
    pub logo: Option<String>,
    pub crunchbase_url: Option<String>,
    pub analytics: Analytics,
}

impl ProjectCreate {
    /// Validate incoming data into a create payload.
    ///
    /// Requires a title of at least 2 characters and a well-formed website.
    ///
    /// # Errors
    ///
    /// Returns every [`ValidationIssue`] found.
    pub fn validate(
        data: &ProjectData,
        project_type: ProjectType,
    ) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let title = data.title().map(str::trim).unwrap_or_default();
        if title.chars().count() < 2 {
            issues.push(ValidationIssue::new(
                "title",
                "ensure this value has at least 2 characters",
            ));
        }

        let website = data.website().map(normalize_website);
        match website.as_deref() {
            None => issues.push(ValidationIssue::new("website", "field required")),
            Some(w) if !is_valid_website(w) => {
                issues.push(ValidationIssue::new("website", "invalid or missing URL host"));
            }
            Some(_) => {}
        }

        if data.logo().is_some_and(|logo| !is_valid_website(logo)) {
            issues.push(ValidationIssue::new("logo", "invalid or missing URL host"));
        }

        match website {
            Some(website) if issues.is_empty() => {
                let mut analytics = Analytics::default();
                analytics.apply(&data.analytics);
                Ok(Self {
                    title: title.to_string(),
                    website,
                    project_type,
                    description: data.description().map(str::to_string),
                    about: data.about().map(str::to_string),
                    logo: data.logo().map(str::to_string),
                    crunchbase_url: data.crunchbase_url().map(str::to_string),
                    analytics,
                })
            }
            _ => Err(issues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn create_requires_title_and_website() {
        let data = ProjectData::default().with_title("A");
        let issues = ProjectCreate::validate(&data, ProjectType::Startup).unwrap_err();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "website"]);
    }

    #[test]
    fn create_rejects_hostless_website() {
        let data = ProjectData::default()
            .with_title("Acme")
            .with_website("localhost");
        let issues = ProjectCreate::validate(&data, ProjectType::Startup).unwrap_err();
        assert_eq!(issues[0].field, "website");
    }

    #[test]
    fn create_carries_analytics() {
        let data = ProjectData::default()
            .with_title("  Acme Robotics ")
            .with_website("www.acmerobotics.io/")
            .with_team_size(12);
        let create = ProjectCreate::validate(&data, ProjectType::Startup).unwrap();
        assert_eq!(create.title, "Acme Robotics");
        assert_eq!(create.website, "https://acmerobotics.io");
        assert_eq!(create.analytics.team_size, Some(12));
    }

    #[test]
    fn analytics_patch_distinguishes_null_from_unset() {
        let mut analytics = Analytics {
            team_size: Some(10),
            location: Some("Austin".to_string()),
            ..Analytics::default()
        };
        let patch: ProjectAnalytics =
            serde_json::from_value(json!({"location": null, "founded": 2019})).unwrap();
        analytics.apply(&patch);

        assert_eq!(analytics.team_size, Some(10));
        assert_eq!(analytics.location, None);
        assert_eq!(analytics.founded, Some(2019));
    }
}
