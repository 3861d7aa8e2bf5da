//! Error types for filtering and admission.

use std::fmt;

use dealflow_core::capabilities::{CompletionError, StoreError};
use dealflow_core::entities::ValidationIssue;
use dealflow_core::enums::{EventName, ProductLine};
use dealflow_core::filters::FilterResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A step could not be evaluated with the data at hand.
///
/// Distinct from a filter saying "no": the company was never judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreconditionFailure {
    pub reason: String,
    /// What the step was looking at when it gave up.
    pub inputs: Value,
}

impl PreconditionFailure {
    #[must_use]
    pub fn new(reason: impl Into<String>, inputs: Value) -> Self {
        Self {
            reason: reason.into(),
            inputs,
        }
    }
}

impl fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Errors raised while building or evaluating filters.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Raised by preprocessors. The pipeline executor turns it into
    /// [`crate::pipeline::PipelineOutcome::PreconditionFailed`].
    #[error("precondition failed: {0}")]
    Precondition(PreconditionFailure),

    #[error("filter '{filter_id}' is missing prompt arguments: {}", missing.join(", "))]
    MissingPromptArgs {
        filter_id: String,
        missing: Vec<String>,
    },

    /// The completion answered, but not in the expected shape.
    #[error("unparsable completion response: {0}")]
    ResponseParse(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("invalid filter configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FilterError {
    /// Parse errors and transient completion errors may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ResponseParse(_) => true,
            Self::Completion(err) => err.is_retryable(),
            Self::Store(StoreError::Backend(_)) => true,
            _ => false,
        }
    }
}

/// Why an admission attempt ended without admitting the company.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("project data failed validation: {}", format_issues(issues))]
    Validation {
        issues: Vec<ValidationIssue>,
        project_data: Value,
    },

    /// The source profile already tracks a company under another website.
    #[error("profile {linkedin_url} already tracks '{existing_website}', not '{website}'")]
    Duplicate {
        linkedin_url: String,
        existing_project_id: i64,
        existing_website: String,
        website: String,
    },

    /// Cached negative classification; no filter ran.
    #[error("project {project_id} was previously classified as not {line}")]
    Rejected { project_id: i64, line: ProductLine },

    /// A company-level gate said no.
    #[error("project {project_id} did not pass {gate}")]
    GateFailed {
        project_id: i64,
        gate: EventName,
        result: Box<FilterResult>,
    },

    #[error("project {project_id}: {failure}")]
    Precondition {
        project_id: i64,
        failure: PreconditionFailure,
    },

    /// Every signal was evaluated and none passed.
    #[error("no signal matched for project {project_id} ({} evaluated)", results.len())]
    NoSignalMatched {
        project_id: i64,
        results: Vec<FilterResult>,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdmissionError {
    /// True when a later attempt with the same input may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Filter(err) => err.is_retryable(),
            Self::Store(StoreError::Backend(_)) => true,
            _ => false,
        }
    }

    /// Company the failure concerns, once resolved.
    #[must_use]
    pub const fn project_id(&self) -> Option<i64> {
        match self {
            Self::Rejected { project_id, .. }
            | Self::GateFailed { project_id, .. }
            | Self::Precondition { project_id, .. }
            | Self::NoSignalMatched { project_id, .. } => Some(*project_id),
            Self::Duplicate {
                existing_project_id,
                ..
            } => Some(*existing_project_id),
            _ => None,
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}
