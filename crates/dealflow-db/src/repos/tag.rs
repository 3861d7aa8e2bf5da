//! Cached company tags (industries, verticals) per data source.

use dealflow_core::enums::TagAttr;

use crate::error::DatabaseError;
use crate::service::FlowService;

impl FlowService {
    pub async fn project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        data_source: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT tag_name FROM project_tags
                 WHERE project_id = ?1 AND attr = ?2 AND data_source = ?3 ORDER BY tag_name",
                libsql::params![project_id, attr.as_str(), data_source],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row.get::<String>(0)?);
        }
        Ok(results)
    }

    /// Replace every tag of `attr` from `data_source` in one transaction.
    pub async fn replace_project_tags(
        &self,
        project_id: i64,
        attr: TagAttr,
        tags: &[String],
        data_source: &str,
    ) -> Result<(), DatabaseError> {
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "DELETE FROM project_tags WHERE project_id = ?1 AND attr = ?2 AND data_source = ?3",
            libsql::params![project_id, attr.as_str(), data_source],
        )
        .await?;
        for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            tx.execute(
                "INSERT OR IGNORE INTO project_tags (project_id, attr, tag_name, data_source)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![project_id, attr.as_str(), tag, data_source],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
