//! Signal identity and provenance schemas.
//!
//! Signals name the investing entity that showed interest in a company.
//! Investor signals are resolved to fund signals before admission, so the
//! admission state machine only ever sees [`FundId`]s.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::urls::normalize_linkedin_url;

/// Fund reference carried by fund-level signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FundId {
    pub id: i64,
}

/// Investor reference carried by investor-sourced signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct InvestorId {
    pub id: i64,
}

/// A fund or an investor, tagged by `entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum InvestingEntity {
    Fund(FundId),
    Investor(InvestorId),
}

/// Platform a direct signal was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Twitter,
    Linkedin,
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates.
fn deserialize_pickup<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(serde::de::Error::custom)
        .and_then(|date| {
            date.and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .ok_or_else(|| serde::de::Error::custom("invalid pickup date"))
        })
}

/// Fund-sourced signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectSignal {
    pub investing_entity: FundId,
    pub signal_source: SignalSource,
    #[serde(deserialize_with = "deserialize_pickup")]
    pub picked_up_date: DateTime<Utc>,
    #[serde(default = "default_count")]
    pub count: u32,
}

const fn default_count() -> u32 {
    1
}

/// Investor-sourced signal from a LinkedIn post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedinPostSignal {
    pub investing_entity: InvestorId,
    pub post_id: i64,
    pub leader_id: i64,
    #[serde(deserialize_with = "deserialize_pickup")]
    pub picked_up_date: DateTime<Utc>,
}

/// A signal, tagged by `signal_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal_type", rename_all = "snake_case")]
pub enum Signal {
    Direct(DirectSignal),
    Linkedin(LinkedinPostSignal),
}

impl Signal {
    #[must_use]
    pub const fn picked_up_date(&self) -> DateTime<Utc> {
        match self {
            Self::Direct(s) => s.picked_up_date,
            Self::Linkedin(s) => s.picked_up_date,
        }
    }

    #[must_use]
    pub const fn investing_entity(&self) -> InvestingEntity {
        match self {
            Self::Direct(s) => InvestingEntity::Fund(s.investing_entity),
            Self::Linkedin(s) => InvestingEntity::Investor(s.investing_entity),
        }
    }
}

/// Year and month a signal link is bucketed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub fn of(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

/// Scraped LinkedIn company record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkedinCompanyDetails {
    pub linkedin_url: String,
    #[serde(default)]
    pub linkedin_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub crunchbase_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub specialities: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i64>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub raw_data: Option<Value>,
}

impl LinkedinCompanyDetails {
    /// Midpoint of a `"11-50 employees"` style size range.
    #[must_use]
    pub fn approx_team_size(&self) -> Option<i64> {
        let size = self.company_size.as_deref()?;
        let mut bounds = size
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .map(str::parse::<i64>);
        let low = bounds.next()?.ok()?;
        let high = bounds.next().and_then(Result::ok).unwrap_or(low);
        Some((low + high) / 2)
    }
}

/// Where a company came from, carried into signal links as provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum ProjectSource {
    Linkedin(LinkedinSource),
}

impl ProjectSource {
    /// Pickup date of the originating signal, if the source carries one.
    #[must_use]
    pub fn picked_up_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Linkedin(source) => source.signal.as_ref().map(Signal::picked_up_date),
        }
    }
}

/// LinkedIn-sourced company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedinSource {
    #[serde(default)]
    pub signal: Option<Signal>,
    pub company_url: String,
    pub linkedin_details: LinkedinCompanyDetails,
}

impl LinkedinSource {
    /// Build a source with a normalized `company_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUrl`] when `company_url` is not a LinkedIn URL.
    pub fn new(
        signal: Option<Signal>,
        company_url: &str,
        linkedin_details: LinkedinCompanyDetails,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            signal,
            company_url: normalize_linkedin_url(company_url)?,
            linkedin_details,
        })
    }

    /// Re-apply URL normalization after deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUrl`] when either URL is not a LinkedIn URL.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.company_url = normalize_linkedin_url(&self.company_url)?;
        self.linkedin_details.linkedin_url =
            normalize_linkedin_url(&self.linkedin_details.linkedin_url)?;
        Ok(self)
    }
}
