use std::path::Path;

use dealflow_core::events::LogEvent;

use crate::error::DatabaseError;
use crate::service::FlowService;

/// Summary of a trail replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub trail_files: u32,
    pub events_replayed: usize,
}

pub struct TrailReplayer;

impl TrailReplayer {
    /// Rebuild the `events` table from the JSONL files in `trail_dir`.
    ///
    /// Existing rows are deleted first; events are re-inserted ordered by
    /// `created_at`. Trail writing is disabled for the duration.
    pub async fn rebuild_events(
        service: &mut FlowService,
        trail_dir: &Path,
    ) -> Result<ReplayReport, DatabaseError> {
        let was_enabled = service.trail().is_enabled();
        service.trail_mut().set_enabled(false);
        let result = Self::replay(service, trail_dir).await;
        service.trail_mut().set_enabled(was_enabled);
        result
    }

    async fn replay(service: &FlowService, trail_dir: &Path) -> Result<ReplayReport, DatabaseError> {
        let mut trail_files = 0u32;
        let mut all_events: Vec<LogEvent> = Vec::new();

        let entries = std::fs::read_dir(trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        for entry in entries {
            let entry = entry.map_err(|e| DatabaseError::Other(e.into()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            trail_files += 1;

            let events: Vec<LogEvent> = serde_jsonlines::json_lines(&path)
                .map_err(|e| DatabaseError::Other(e.into()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DatabaseError::Other(e.into()))?;
            all_events.extend(events);
        }

        all_events.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let cleared = service.clear_events().await?;
        service.insert_events(&all_events).await?;
        tracing::info!(
            trail_files,
            cleared,
            replayed = all_events.len(),
            "events rebuilt from trail"
        );

        Ok(ReplayReport {
            trail_files,
            events_replayed: all_events.len(),
        })
    }
}
