//! JSONL trail writer.
//!
//! Appends `LogEvent` records to per-group `{trail_dir}/{group_id}.jsonl`
//! files. Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use dealflow_core::events::LogEvent;
use uuid::Uuid;

use crate::error::DatabaseError;

/// File stem for events recorded without a correlation id.
const UNGROUPED: &str = "ungrouped";

/// Appends admission events to per-group JSONL files.
pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a new `TrailWriter` pointing at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    /// Disabled during replay so replayed events are not written twice.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path of the trail file for a group.
    #[must_use]
    pub fn group_path(&self, group_id: Option<Uuid>) -> PathBuf {
        let stem = group_id.map_or_else(|| UNGROUPED.to_string(), |g| g.to_string());
        self.trail_dir.join(format!("{stem}.jsonl"))
    }

    /// Append events, each to the file of its own group.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a file write fails.
    pub fn append(&self, events: &[LogEvent]) -> Result<(), DatabaseError> {
        if !self.enabled || events.is_empty() {
            return Ok(());
        }

        let mut start = 0;
        while start < events.len() {
            let group = events[start].group_id;
            let end = events[start..]
                .iter()
                .position(|e| e.group_id != group)
                .map_or(events.len(), |offset| start + offset);
            serde_jsonlines::append_json_lines(self.group_path(group), &events[start..end])
                .map_err(|e| DatabaseError::Other(e.into()))?;
            start = end;
        }
        Ok(())
    }

    /// Read back every event recorded for a group, in append order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be parsed.
    pub fn read_group(&self, group_id: Uuid) -> Result<Vec<LogEvent>, DatabaseError> {
        let path = self.group_path(Some(group_id));
        if self.trail_dir.as_os_str().is_empty() || !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<Result<Vec<LogEvent>, _>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    /// The directory where trail files are stored.
    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }
}
