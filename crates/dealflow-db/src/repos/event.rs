//! Admission event log table.

use dealflow_core::events::LogEvent;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_json, to_json};
use crate::service::FlowService;

const EVENT_COLUMNS: &str =
    "event_name, group_id, display_name, details, project_id, project_data, data, created_at";

fn row_to_event(row: &libsql::Row) -> Result<LogEvent, DatabaseError> {
    let group_id = get_opt_string(row, 1)?
        .map(|g| {
            Uuid::parse_str(&g)
                .map_err(|e| DatabaseError::Query(format!("Invalid event group id '{g}': {e}")))
        })
        .transpose()?;
    let project_data = get_opt_string(row, 5)?;
    Ok(LogEvent {
        event_name: parse_enum(&row.get::<String>(0)?)?,
        group_id,
        display_name: get_opt_string(row, 2)?,
        details: get_opt_string(row, 3)?,
        project_id: row.get::<Option<i64>>(4)?,
        project_data: parse_optional_json(project_data.as_deref())?,
        data: parse_json(&row.get::<String>(6)?)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl FlowService {
    /// Append events in one transaction, preserving slice order.
    pub async fn insert_events(&self, events: &[LogEvent]) -> Result<(), DatabaseError> {
        if events.is_empty() {
            return Ok(());
        }
        let tx = self.db().conn().transaction().await?;
        for event in events {
            let project_data = event.project_data.as_ref().map(to_json).transpose()?;
            tx.execute(
                "INSERT INTO events
                   (group_id, event_name, kind, display_name, details, project_id, project_data, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    event.group_id.map(|g| g.to_string()),
                    event.event_name.as_str(),
                    event.kind().as_str(),
                    event.display_name.as_deref(),
                    event.details.as_deref(),
                    event.project_id,
                    project_data,
                    to_json(&event.data)?,
                    event.created_at.to_rfc3339()
                ],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn events_for_group(&self, group_id: Uuid) -> Result<Vec<LogEvent>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE group_id = ?1 ORDER BY id"),
                [group_id.to_string()],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_event(&row)?);
        }
        Ok(results)
    }

    pub async fn events_for_project(&self, project_id: i64) -> Result<Vec<LogEvent>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE project_id = ?1 ORDER BY id"),
                [project_id],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_event(&row)?);
        }
        Ok(results)
    }

    /// Delete every stored event. Used before replaying the trail.
    pub async fn clear_events(&self) -> Result<u64, DatabaseError> {
        Ok(self.db().conn().execute("DELETE FROM events", ()).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_service;
    use dealflow_core::enums::EventName;
    use dealflow_core::events::{EventCollector, EventKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn events_roundtrip_by_group_and_project() {
        let svc = test_service().await;
        let mut collector = EventCollector::new();
        let started = collector.event(EventName::FilterIsStartupPassed).filters(vec![]);
        collector.push(started);
        let created = collector
            .event(EventName::ProjectCreated)
            .project(7)
            .payload(json!({"signal_added": []}));
        collector.push(created);
        let events = collector.drain();

        svc.insert_events(&events).await.unwrap();

        let by_group = svc.events_for_group(collector.group_id).await.unwrap();
        assert_eq!(by_group, events);
        assert_eq!(by_group[0].kind(), EventKind::Filtering);

        let by_project = svc.events_for_project(7).await.unwrap();
        assert_eq!(by_project.len(), 1);
        assert_eq!(by_project[0].event_name, EventName::ProjectCreated);

        assert_eq!(svc.clear_events().await.unwrap(), 2);
    }
}
