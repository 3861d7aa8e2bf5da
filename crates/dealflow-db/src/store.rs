//! Collaborator trait implementations for [`FlowService`].

use dealflow_core::capabilities::{EventSink, ProjectStore, Publisher, PublishingError, StoreError};
use dealflow_core::entities::{
    Fund, Investor, LinkedinProfile, NewSignalLink, ProjectCreate, TrackedProject,
};
use dealflow_core::enums::{ProductLine, TagAttr};
use dealflow_core::events::LogEvent;
use dealflow_core::signals::LinkedinCompanyDetails;

use crate::service::FlowService;

impl ProjectStore for FlowService {
    async fn get_fund(&self, id: i64) -> Result<Option<Fund>, StoreError> {
        Ok(Self::get_fund(self, id).await?)
    }

    async fn get_investor(&self, id: i64) -> Result<Option<Investor>, StoreError> {
        Ok(Self::get_investor(self, id).await?)
    }

    async fn upsert_linkedin_profile(
        &self,
        linkedin_url: &str,
        details: &LinkedinCompanyDetails,
    ) -> Result<LinkedinProfile, StoreError> {
        Ok(Self::upsert_linkedin_profile(self, linkedin_url, details).await?)
    }

    async fn link_profile(&self, profile_id: i64, project_id: i64) -> Result<(), StoreError> {
        Ok(Self::link_profile(self, profile_id, project_id).await?)
    }

    async fn get_project(&self, id: i64) -> Result<Option<TrackedProject>, StoreError> {
        Ok(Self::get_project(self, id).await?)
    }

    async fn find_project_by_website(
        &self,
        website: &str,
    ) -> Result<Option<TrackedProject>, StoreError> {
        Ok(Self::find_project_by_website(self, website).await?)
    }

    async fn find_or_create_project(
        &self,
        create: &ProjectCreate,
    ) -> Result<(TrackedProject, bool), StoreError> {
        Ok(Self::find_or_create_project(self, create).await?)
    }

    async fn save_project(&self, project: &TrackedProject) -> Result<(), StoreError> {
        Ok(Self::save_project(self, project).await?)
    }

    async fn set_classification(
        &self,
        project_id: i64,
        line: ProductLine,
        value: bool,
    ) -> Result<(), StoreError> {
        Ok(Self::set_classification(self, project_id, line, value).await?)
    }

    async fn project_fund_ids(&self, project_id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(Self::project_fund_ids(self, project_id).await?)
    }

    async fn add_signal_link(&self, link: &NewSignalLink) -> Result<bool, StoreError> {
        Ok(Self::add_signal_link(self, link).await?)
    }

    async fn project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        data_source: &str,
    ) -> Result<Vec<String>, StoreError> {
        Ok(Self::project_tags(self, project_id, attr, data_source).await?)
    }

    async fn replace_project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        tags: &[String],
        data_source: &str,
    ) -> Result<(), StoreError> {
        Ok(Self::replace_project_tags(self, project_id, attr, tags, data_source).await?)
    }
}

impl Publisher for FlowService {
    async fn publish(&self, project_id: i64) -> Result<(), PublishingError> {
        self.publish_project(project_id).await.map(|_| ())
    }
}

impl EventSink for FlowService {
    /// Append to the JSONL trail, then to the `events` table.
    async fn record(&self, events: &[LogEvent]) -> Result<(), StoreError> {
        self.trail().append(events)?;
        self.insert_events(events).await?;
        tracing::debug!(count = events.len(), "events recorded");
        Ok(())
    }
}
