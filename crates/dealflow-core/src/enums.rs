//! Status enums, product lines, filter modes and event names for dealflow.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for SQL storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

macro_rules! sql_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Return the string representation used in SQL storage.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

/// Curation status of a tracked company.
///
/// ```text
/// discovered → pending → review → accepted → published
///                               → rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Discovered,
    Pending,
    Review,
    Accepted,
    Rejected,
    Published,
}

sql_enum!(ProjectStatus {
    Discovered => "discovered",
    Pending => "pending",
    Review => "review",
    Accepted => "accepted",
    Rejected => "rejected",
    Published => "published",
});

impl ProjectStatus {
    /// Statuses an admission never overwrites.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Statuses the feed publisher accepts.
    #[must_use]
    pub const fn is_publishable(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

// ---------------------------------------------------------------------------
// ProductLine / ProjectType
// ---------------------------------------------------------------------------

/// Product line an admission runs for. Each line has its own classification flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductLine {
    Startup,
    B2b,
}

sql_enum!(ProductLine {
    Startup => "startup",
    B2b => "b2b",
});

impl ProductLine {
    /// Project type recorded on companies created through this line.
    #[must_use]
    pub const fn project_type(self) -> ProjectType {
        match self {
            Self::Startup => ProjectType::Startup,
            Self::B2b => ProjectType::Competitors,
        }
    }
}

/// Kind of tracked company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    Startup,
    Competitors,
}

sql_enum!(ProjectType {
    Startup => "startup",
    Competitors => "competitors",
});

// ---------------------------------------------------------------------------
// Filter modes
// ---------------------------------------------------------------------------

/// Whether a regex or tag filter requires or forbids a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Include,
    Exclude,
}

/// Boolean composition of a combined filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    And,
    Or,
}

/// Tag attribute cached per company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TagAttr {
    Industries,
    Verticals,
}

sql_enum!(TagAttr {
    Industries => "industries",
    Verticals => "verticals",
});

// ---------------------------------------------------------------------------
// InvestmentStage
// ---------------------------------------------------------------------------

/// Funding stage of a company, ordered from earliest to latest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    Ipo,
}

sql_enum!(InvestmentStage {
    PreSeed => "pre_seed",
    Seed => "seed",
    SeriesA => "series_a",
    SeriesB => "series_b",
    SeriesC => "series_c",
    SeriesD => "series_d",
    Ipo => "ipo",
});

impl InvestmentStage {
    /// Parse the loose spellings found in scraped data ("Pre-Seed", "series a", "IPO").
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        match key.trim_matches('_') {
            "pre_seed" | "preseed" => Some(Self::PreSeed),
            "seed" => Some(Self::Seed),
            "series_a" => Some(Self::SeriesA),
            "series_b" => Some(Self::SeriesB),
            "series_c" => Some(Self::SeriesC),
            "series_d" => Some(Self::SeriesD),
            "ipo" => Some(Self::Ipo),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventName
// ---------------------------------------------------------------------------

/// Name of an admission event. Stored verbatim in the event trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    FilterIsStartupPassed,
    FilterIsStartupFailed,
    FilterIsStartupPassedHistoric,
    FilterIsStartupFailedHistoric,
    CompanyFilterPassed,
    CompanyFilterFailed,
    FilterIsValidCompetitorPassed,
    FilterIsValidCompetitorFailed,
    FilterSignalPassed,
    FilterSignalFailed,
    FilterSignalPassedHistoric,
    FilterPrerequisitesFailed,
    UnexpectedFilterFailure,
    NoSignalMatched,
    ValidationFailed,
    DuplicateProject,
    ProjectRejected,
    PublishFailed,
    ProjectCreated,
    ProjectUpdated,
}

sql_enum!(EventName {
    FilterIsStartupPassed => "filter_is_startup_passed",
    FilterIsStartupFailed => "filter_is_startup_failed",
    FilterIsStartupPassedHistoric => "filter_is_startup_passed_historic",
    FilterIsStartupFailedHistoric => "filter_is_startup_failed_historic",
    CompanyFilterPassed => "company_filter_passed",
    CompanyFilterFailed => "company_filter_failed",
    FilterIsValidCompetitorPassed => "filter_is_valid_competitor_passed",
    FilterIsValidCompetitorFailed => "filter_is_valid_competitor_failed",
    FilterSignalPassed => "filter_signal_passed",
    FilterSignalFailed => "filter_signal_failed",
    FilterSignalPassedHistoric => "filter_signal_passed_historic",
    FilterPrerequisitesFailed => "filter_prerequisites_failed",
    UnexpectedFilterFailure => "unexpected_filter_failure",
    NoSignalMatched => "no_signal_matched",
    ValidationFailed => "validation_failed",
    DuplicateProject => "duplicate_project",
    ProjectRejected => "project_rejected",
    PublishFailed => "publish_failed",
    ProjectCreated => "project_created",
    ProjectUpdated => "project_updated",
});

impl EventName {
    /// Human-readable default label for the event.
    #[must_use]
    pub const fn default_display_name(self) -> &'static str {
        match self {
            Self::FilterIsStartupPassed => "Company is a valid startup",
            Self::FilterIsStartupFailed => "Company is not a startup",
            Self::FilterIsStartupPassedHistoric => "Company was previously classified as a startup",
            Self::FilterIsStartupFailedHistoric => {
                "Company was previously classified as not a startup"
            }
            Self::CompanyFilterPassed => "Company passed filters",
            Self::CompanyFilterFailed => "Company did not pass filters",
            Self::FilterIsValidCompetitorPassed => "Company is a valid competitor",
            Self::FilterIsValidCompetitorFailed => "Company is not a valid competitor",
            Self::FilterSignalPassed => "Signal matched",
            Self::FilterSignalFailed => "Signal did not match",
            Self::FilterSignalPassedHistoric => "Signal matched in the past",
            Self::FilterPrerequisitesFailed => "Filter prerequisites failed",
            Self::UnexpectedFilterFailure => "Unexpected filter failure",
            Self::NoSignalMatched => "No signals matched",
            Self::ValidationFailed => "Project data failed validation",
            Self::DuplicateProject => "Duplicate project",
            Self::ProjectRejected => "Project was previously rejected",
            Self::PublishFailed => "Project failed to publish",
            Self::ProjectCreated => "Project created",
            Self::ProjectUpdated => "Project updated",
        }
    }
}
