//! Collaborator traits consumed by the filter pipeline and admission.
//!
//! Implementations live in `dealflow-db` (store, publisher, event sink) and
//! `dealflow-llm` (completion client). Tests substitute in-memory stubs.

use std::future::Future;

use thiserror::Error;

use crate::entities::{
    Fund, Investor, LinkedinProfile, NewSignalLink, ProjectCreate, TrackedProject,
};
use crate::enums::{ProductLine, TagAttr};
use crate::events::LogEvent;
use crate::signals::LinkedinCompanyDetails;

/// Errors surfaced by a [`ProjectStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint matched more than one record.
    #[error("duplicate {entity}: {detail}")]
    Duplicate { entity: &'static str, detail: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by a [`CompletionClient`].
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion transport error: {0}")]
    Transport(String),

    #[error("completion rate limited")]
    RateLimited,

    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion response malformed: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Transport errors, rate limits and server errors may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Errors surfaced by a [`Publisher`]. Never fatal to admission.
#[derive(Debug, Error)]
pub enum PublishingError {
    #[error("project {0} not found")]
    NotFound(i64),

    #[error("project cannot be published: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistent store of funds, investors, companies and their links.
pub trait ProjectStore {
    fn get_fund(&self, id: i64) -> impl Future<Output = Result<Option<Fund>, StoreError>> + Send;

    fn get_investor(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Investor>, StoreError>> + Send;

    /// Update-or-create the LinkedIn profile keyed by its normalized URL.
    fn upsert_linkedin_profile(
        &self,
        linkedin_url: &str,
        details: &LinkedinCompanyDetails,
    ) -> impl Future<Output = Result<LinkedinProfile, StoreError>> + Send;

    fn link_profile(
        &self,
        profile_id: i64,
        project_id: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_project(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<TrackedProject>, StoreError>> + Send;

    fn find_project_by_website(
        &self,
        website: &str,
    ) -> impl Future<Output = Result<Option<TrackedProject>, StoreError>> + Send;

    /// Find the non-removed company with this website or create it.
    /// The flag is `true` when the company already existed.
    fn find_or_create_project(
        &self,
        create: &ProjectCreate,
    ) -> impl Future<Output = Result<(TrackedProject, bool), StoreError>> + Send;

    /// Persist detail fields, status and analytics.
    fn save_project(
        &self,
        project: &TrackedProject,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_classification(
        &self,
        project_id: i64,
        line: ProductLine,
        value: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Funds already linked to the company by a signal.
    fn project_fund_ids(
        &self,
        project_id: i64,
    ) -> impl Future<Output = Result<Vec<i64>, StoreError>> + Send;

    /// Insert a signal link unless one exists for the same month.
    /// Returns `true` when a row was inserted.
    fn add_signal_link(
        &self,
        link: &NewSignalLink,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        data_source: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Replace the tags of one attribute and data source.
    fn replace_project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        tags: &[String],
        data_source: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// LLM text completion.
pub trait CompletionClient {
    fn complete(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// Publishing step that exposes a company on the client feed.
pub trait Publisher {
    fn publish(&self, project_id: i64)
    -> impl Future<Output = Result<(), PublishingError>> + Send;
}

/// Destination of collected admission events.
pub trait EventSink {
    fn record(&self, events: &[LogEvent]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_completion_errors() {
        assert!(CompletionError::Transport("reset".into()).is_retryable());
        assert!(CompletionError::RateLimited.is_retryable());
        assert!(CompletionError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(!CompletionError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!CompletionError::InvalidResponse("no choices".into()).is_retryable());
    }
}
