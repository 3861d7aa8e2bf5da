//! Tracked company repository.
//!
//! Companies are keyed by normalized website: the partial unique index
//! `idx_tracked_projects_website` allows at most one non-removed row per
//! website, and find-or-create relies on it instead of a read-then-write.

use chrono::Utc;
use dealflow_core::entities::{ProjectCreate, TrackedProject};
use dealflow_core::enums::{ProductLine, ProjectStatus};
use dealflow_core::urls::normalize_website;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::helpers::{
    bool_value, get_opt_bool, get_opt_string, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime, to_json,
};
use crate::service::FlowService;

const PROJECT_COLUMNS: &str = "id, uuid, title, website, description, about, logo, crunchbase_url, \
     project_type, status, is_startup, is_b2b, analytics, discovered_date, removed, created_at, updated_at";

fn row_to_project(row: &libsql::Row) -> Result<TrackedProject, DatabaseError> {
    let uuid = row.get::<String>(1)?;
    let discovered = get_opt_string(row, 13)?;
    Ok(TrackedProject {
        id: row.get::<i64>(0)?,
        uuid: Uuid::parse_str(&uuid)
            .map_err(|e| DatabaseError::Query(format!("Invalid project uuid '{uuid}': {e}")))?,
        title: row.get::<String>(2)?,
        website: get_opt_string(row, 3)?,
        description: get_opt_string(row, 4)?,
        about: get_opt_string(row, 5)?,
        logo: get_opt_string(row, 6)?,
        crunchbase_url: get_opt_string(row, 7)?,
        project_type: parse_enum(&row.get::<String>(8)?)?,
        status: parse_enum(&row.get::<String>(9)?)?,
        is_startup: get_opt_bool(row, 10)?,
        is_b2b: get_opt_bool(row, 11)?,
        analytics: parse_json(&row.get::<String>(12)?)?,
        discovered_date: parse_optional_datetime(discovered.as_deref())?,
        removed: row.get::<i64>(14)? != 0,
        created_at: parse_datetime(&row.get::<String>(15)?)?,
        updated_at: parse_datetime(&row.get::<String>(16)?)?,
    })
}

const fn classification_column(line: ProductLine) -> &'static str {
    match line {
        ProductLine::Startup => "is_startup",
        ProductLine::B2b => "is_b2b",
    }
}

impl FlowService {
    /// Find the live company with `create.website` or insert a new one.
    ///
    /// Returns the company and whether it already existed.
    pub async fn find_or_create_project(
        &self,
        create: &ProjectCreate,
    ) -> Result<(TrackedProject, bool), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO tracked_projects
                   (uuid, title, website, description, about, logo, crunchbase_url,
                    project_type, analytics, discovered_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?10)
                 ON CONFLICT DO NOTHING",
                libsql::params![
                    Uuid::new_v4().to_string(),
                    create.title.as_str(),
                    create.website.as_str(),
                    create.description.as_deref(),
                    create.about.as_deref(),
                    create.logo.as_deref(),
                    create.crunchbase_url.as_deref(),
                    create.project_type.as_str(),
                    to_json(&create.analytics)?,
                    now
                ],
            )
            .await?;

        let project = self
            .find_project_by_website(&create.website)
            .await?
            .ok_or(DatabaseError::NoResult)?;
        let existed = inserted == 0;
        tracing::debug!(project_id = project.id, existed, website = %create.website, "find_or_create_project");
        Ok((project, existed))
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<TrackedProject>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {PROJECT_COLUMNS} FROM tracked_projects WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_project_by_uuid(&self, uuid: Uuid) -> Result<Option<TrackedProject>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PROJECT_COLUMNS} FROM tracked_projects WHERE uuid = ?1"),
                [uuid.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    /// Live company with this website. The input is normalized first.
    pub async fn find_project_by_website(
        &self,
        website: &str,
    ) -> Result<Option<TrackedProject>, DatabaseError> {
        let website = normalize_website(website);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM tracked_projects WHERE website = ?1 AND removed = 0"
                ),
                [website.as_str()],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let project = row_to_project(&row)?;
        if rows.next().await?.is_some() {
            return Err(DatabaseError::Duplicate {
                entity: "tracked_project",
                detail: format!("more than one live company with website {website}"),
            });
        }
        Ok(Some(project))
    }

    /// Persist detail fields, status, classification and analytics.
    pub async fn save_project(&self, project: &TrackedProject) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE tracked_projects SET
                   title = ?2, description = ?3, about = ?4, logo = ?5, crunchbase_url = ?6,
                   status = ?7, is_startup = ?8, is_b2b = ?9, analytics = ?10,
                   updated_at = ?11
                 WHERE id = ?1",
                libsql::params![
                    project.id,
                    project.title.as_str(),
                    project.description.as_deref(),
                    project.about.as_deref(),
                    project.logo.as_deref(),
                    project.crunchbase_url.as_deref(),
                    project.status.as_str(),
                    bool_value(project.is_startup),
                    bool_value(project.is_b2b),
                    to_json(&project.analytics)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn set_classification(
        &self,
        project_id: i64,
        line: ProductLine,
        value: bool,
    ) -> Result<(), DatabaseError> {
        let column = classification_column(line);
        self.db()
            .conn()
            .execute(
                &format!("UPDATE tracked_projects SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
                libsql::params![project_id, i64::from(value), Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn set_status(&self, project_id: i64, status: ProjectStatus) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE tracked_projects SET status = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params![project_id, status.as_str(), Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    /// Soft-delete a company, freeing its website for a new record.
    pub async fn remove_project(&self, project_id: i64) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE tracked_projects SET removed = 1, updated_at = ?2 WHERE id = ?1",
                libsql::params![project_id, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    /// Live companies, newest first, optionally narrowed to one status.
    pub async fn list_projects(
        &self,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<TrackedProject>, DatabaseError> {
        let mut rows = match status {
            Some(status) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {PROJECT_COLUMNS} FROM tracked_projects
                             WHERE removed = 0 AND status = ?1 ORDER BY id DESC LIMIT ?2"
                        ),
                        libsql::params![status.as_str(), i64::from(limit)],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {PROJECT_COLUMNS} FROM tracked_projects
                             WHERE removed = 0 ORDER BY id DESC LIMIT ?1"
                        ),
                        [i64::from(limit)],
                    )
                    .await?
            }
        };
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_project(&row)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{acme_create, seed_project, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let svc = test_service().await;
        let create = acme_create("acmerobotics.io");

        let (first, existed) = svc.find_or_create_project(&create).await.unwrap();
        assert!(!existed);
        assert_eq!(first.status, ProjectStatus::Discovered);
        assert_eq!(first.analytics.team_size, Some(12));
        assert!(first.discovered_date.is_some());

        let (second, existed) = svc.find_or_create_project(&create).await.unwrap();
        assert!(existed);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn lookup_normalizes_website() {
        let svc = test_service().await;
        let project = seed_project(&svc, "https://acmerobotics.io").await;

        let found = svc
            .find_project_by_website("HTTP://www.AcmeRobotics.io/?ref=x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, project.id);
    }

    #[tokio::test]
    async fn removed_company_frees_its_website() {
        let svc = test_service().await;
        let project = seed_project(&svc, "https://acmerobotics.io").await;
        svc.remove_project(project.id).await.unwrap();

        assert!(svc.find_project_by_website("acmerobotics.io").await.unwrap().is_none());
        let (fresh, existed) = svc
            .find_or_create_project(&acme_create("acmerobotics.io"))
            .await
            .unwrap();
        assert!(!existed);
        assert_ne!(fresh.id, project.id);
    }

    #[tokio::test]
    async fn classification_and_status_persist() {
        let svc = test_service().await;
        let project = seed_project(&svc, "https://acmerobotics.io").await;
        assert_eq!(project.is_startup, None);

        svc.set_classification(project.id, ProductLine::Startup, false)
            .await
            .unwrap();
        svc.set_status(project.id, ProjectStatus::Review).await.unwrap();

        let loaded = svc.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(loaded.is_startup, Some(false));
        assert_eq!(loaded.is_b2b, None);
        assert_eq!(loaded.status, ProjectStatus::Review);
        assert_eq!(
            svc.list_projects(Some(ProjectStatus::Review), 10).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn save_project_roundtrips_details() {
        let svc = test_service().await;
        let mut project = seed_project(&svc, "https://acmerobotics.io").await;
        project.about = Some("Robots that pick".to_string());
        project.analytics.verticals = vec!["logistics".to_string()];
        project.is_b2b = Some(true);
        svc.save_project(&project).await.unwrap();

        let loaded = svc.get_project_by_uuid(project.uuid).await.unwrap().unwrap();
        assert_eq!(loaded.about.as_deref(), Some("Robots that pick"));
        assert_eq!(loaded.analytics.verticals, vec!["logistics".to_string()]);
        assert_eq!(loaded.is_b2b, Some(true));
    }
}
