//! Client feed publishing.
//!
//! A published company is copied into `feed_entries`, the read model behind
//! the client-facing feed. Publishing is repeatable: a second publish
//! refreshes the entry in place.

use chrono::Utc;
use dealflow_core::capabilities::{PublishingError, StoreError};
use dealflow_core::entities::{FeedEntry, SocialEntry, TrackedProject};
use dealflow_core::enums::TagAttr;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_json, to_json};
use crate::service::FlowService;

const FEED_COLUMNS: &str =
    "project_uuid, title, website, logo, about, verticals, socials, discovered_date, published_at";

/// Data source of tags written by the LLM tagging step.
const LLM_TAG_SOURCE: &str = "llm";

fn row_to_entry(row: &libsql::Row) -> Result<FeedEntry, DatabaseError> {
    let uuid = row.get::<String>(0)?;
    Ok(FeedEntry {
        project_uuid: Uuid::parse_str(&uuid)
            .map_err(|e| DatabaseError::Query(format!("Invalid feed uuid '{uuid}': {e}")))?,
        title: row.get::<String>(1)?,
        website: row.get::<String>(2)?,
        logo: get_opt_string(row, 3)?,
        about: get_opt_string(row, 4)?,
        verticals: parse_json(&row.get::<String>(5)?)?,
        socials: parse_json(&row.get::<String>(6)?)?,
        discovered_date: parse_datetime(&row.get::<String>(7)?)?,
        published_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

fn store_err(err: DatabaseError) -> PublishingError {
    PublishingError::Store(StoreError::from(err))
}

fn check_publishable(project: &TrackedProject) -> Result<(), PublishingError> {
    if project.removed {
        return Err(PublishingError::Invalid("project was removed".into()));
    }
    if !project.status.is_publishable() {
        return Err(PublishingError::Invalid(format!(
            "status '{}' cannot be published",
            project.status
        )));
    }
    if project.website.is_none() {
        return Err(PublishingError::Invalid("website is required".into()));
    }
    if project.discovered_date.is_none() {
        return Err(PublishingError::Invalid("discovered date is required".into()));
    }
    Ok(())
}

impl FlowService {
    /// Build and upsert the feed entry of a company.
    ///
    /// # Errors
    ///
    /// Returns [`PublishingError::NotFound`] for an unknown id and
    /// [`PublishingError::Invalid`] when the company fails the publish checks.
    pub async fn publish_project(&self, project_id: i64) -> Result<FeedEntry, PublishingError> {
        let project = self
            .get_project(project_id)
            .await
            .map_err(store_err)?
            .ok_or(PublishingError::NotFound(project_id))?;
        check_publishable(&project)?;

        let mut verticals = project.analytics.verticals.clone();
        for tag in self
            .project_tags(project_id, TagAttr::Verticals, LLM_TAG_SOURCE)
            .await
            .map_err(store_err)?
        {
            if !verticals.iter().any(|v| v.eq_ignore_ascii_case(&tag)) {
                verticals.push(tag);
            }
        }

        let mut socials = Vec::new();
        if let Some(profile) = self.profile_for_project(project_id).await.map_err(store_err)? {
            socials.push(SocialEntry {
                title: "linkedin_url".into(),
                url: profile.linkedin_url,
                icon: "linkedin".into(),
            });
        }
        if let Some(crunchbase) = &project.crunchbase_url {
            socials.push(SocialEntry {
                title: "crunchbase_url".into(),
                url: crunchbase.clone(),
                icon: "crunchbase".into(),
            });
        }

        let entry = FeedEntry {
            project_uuid: project.uuid,
            title: project.title.clone(),
            website: project.website.clone().unwrap_or_default(),
            logo: project.logo.clone(),
            about: project.about.clone().or_else(|| project.description.clone()),
            verticals,
            socials,
            discovered_date: project.discovered_date.unwrap_or(project.created_at),
            published_at: Utc::now(),
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO feed_entries
                   (project_uuid, title, website, logo, about, verticals, socials, discovered_date, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(project_uuid) DO UPDATE SET
                   title = excluded.title, website = excluded.website, logo = excluded.logo,
                   about = excluded.about, verticals = excluded.verticals, socials = excluded.socials,
                   discovered_date = excluded.discovered_date, published_at = excluded.published_at",
                libsql::params![
                    entry.project_uuid.to_string(),
                    entry.title.as_str(),
                    entry.website.as_str(),
                    entry.logo.as_deref(),
                    entry.about.as_deref(),
                    to_json(&entry.verticals).map_err(store_err)?,
                    to_json(&entry.socials).map_err(store_err)?,
                    entry.discovered_date.to_rfc3339(),
                    entry.published_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| store_err(e.into()))?;

        tracing::info!(project_id, uuid = %entry.project_uuid, "project published to feed");
        Ok(entry)
    }

    pub async fn get_feed_entry(&self, project_uuid: Uuid) -> Result<Option<FeedEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {FEED_COLUMNS} FROM feed_entries WHERE project_uuid = ?1"),
                [project_uuid.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_feed(&self, limit: u32) -> Result<Vec<FeedEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {FEED_COLUMNS} FROM feed_entries ORDER BY published_at DESC LIMIT ?1"),
                [i64::from(limit)],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_entry(&row)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_project, test_service};
    use dealflow_core::enums::ProjectStatus;
    use dealflow_core::signals::LinkedinCompanyDetails;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn publish_builds_entry_from_project_profile_and_tags() {
        let svc = test_service().await;
        let mut project = seed_project(&svc, "https://acmerobotics.io").await;
        project.analytics.verticals = vec!["Logistics".into()];
        project.crunchbase_url = Some("https://www.crunchbase.com/organization/acme".into());
        svc.save_project(&project).await.unwrap();
        svc.replace_project_tags(
            project.id,
            TagAttr::Verticals,
            &["logistics".into(), "Warehousing".into()],
            "llm",
        )
        .await
        .unwrap();

        let details = LinkedinCompanyDetails {
            linkedin_url: "https://www.linkedin.com/company/acme".into(),
            title: "Acme Robotics".into(),
            ..LinkedinCompanyDetails::default()
        };
        let profile = svc
            .upsert_linkedin_profile("https://www.linkedin.com/company/acme", &details)
            .await
            .unwrap();
        svc.link_profile(profile.id, project.id).await.unwrap();

        let entry = svc.publish_project(project.id).await.unwrap();
        assert_eq!(entry.verticals, vec!["Logistics".to_string(), "Warehousing".to_string()]);
        assert_eq!(entry.about.as_deref(), Some("Warehouse robots for mid-size distributors"));
        let icons: Vec<&str> = entry.socials.iter().map(|s| s.icon.as_str()).collect();
        assert_eq!(icons, vec!["linkedin", "crunchbase"]);

        let stored = svc.get_feed_entry(project.uuid).await.unwrap().unwrap();
        assert_eq!(stored, entry);

        svc.publish_project(project.id).await.unwrap();
        assert_eq!(svc.list_feed(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_project_is_not_published() {
        let svc = test_service().await;
        let project = seed_project(&svc, "https://acmerobotics.io").await;
        svc.set_status(project.id, ProjectStatus::Rejected).await.unwrap();

        let err = svc.publish_project(project.id).await.unwrap_err();
        assert!(matches!(err, PublishingError::Invalid(_)));
        assert!(svc.get_feed_entry(project.uuid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let svc = test_service().await;
        let err = svc.publish_project(99).await.unwrap_err();
        assert!(matches!(err, PublishingError::NotFound(99)));
    }
}
