//! LinkedIn company profile repository.

use chrono::Utc;
use dealflow_core::entities::LinkedinProfile;
use dealflow_core::signals::LinkedinCompanyDetails;
use dealflow_core::urls::normalize_website;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, to_json};
use crate::service::FlowService;

const PROFILE_COLUMNS: &str = "id, linkedin_url, linkedin_id, title, website, tracked_project_id, last_parsed";

fn row_to_profile(row: &libsql::Row) -> Result<LinkedinProfile, DatabaseError> {
    Ok(LinkedinProfile {
        id: row.get::<i64>(0)?,
        linkedin_url: row.get::<String>(1)?,
        linkedin_id: row.get::<Option<i64>>(2)?,
        title: get_opt_string(row, 3)?,
        website: get_opt_string(row, 4)?,
        tracked_project_id: row.get::<Option<i64>>(5)?,
        last_parsed: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl FlowService {
    /// Update-or-create the profile keyed by its normalized LinkedIn URL.
    ///
    /// An existing link to a tracked company is kept.
    pub async fn upsert_linkedin_profile(
        &self,
        linkedin_url: &str,
        details: &LinkedinCompanyDetails,
    ) -> Result<LinkedinProfile, DatabaseError> {
        let website = details
            .website
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .map(normalize_website);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO linkedin_profiles (linkedin_url, linkedin_id, title, website, details, last_parsed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(linkedin_url) DO UPDATE SET
                       linkedin_id = COALESCE(excluded.linkedin_id, linkedin_profiles.linkedin_id),
                       title = excluded.title,
                       website = excluded.website,
                       details = excluded.details,
                       last_parsed = excluded.last_parsed
                     RETURNING {PROFILE_COLUMNS}"
                ),
                libsql::params![
                    linkedin_url,
                    details.linkedin_id,
                    details.title.as_str(),
                    website,
                    to_json(details)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_profile(&row)
    }

    pub async fn link_profile(&self, profile_id: i64, project_id: i64) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE linkedin_profiles SET tracked_project_id = ?2 WHERE id = ?1",
                libsql::params![profile_id, project_id],
            )
            .await?;
        Ok(())
    }

    pub async fn profile_for_project(
        &self,
        project_id: i64,
    ) -> Result<Option<LinkedinProfile>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM linkedin_profiles
                     WHERE tracked_project_id = ?1 ORDER BY last_parsed DESC LIMIT 1"
                ),
                [project_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }
}
