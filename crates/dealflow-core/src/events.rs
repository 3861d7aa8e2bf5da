//! Admission event log.
//!
//! Every admission attempt collects [`LogEvent`]s in an [`EventCollector`]
//! under one correlation id (`group_id`). The collector is flushed to an
//! event sink at the end of the attempt, whether it succeeded or not.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::enums::EventName;
use crate::filters::FilterResult;

/// Payload of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventData {
    Empty,
    Filters(Vec<FilterResult>),
    Json(Value),
}

/// Coarse event category derived from the record's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Log,
    Project,
    Filtering,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Project => "project",
            Self::Filtering => "filtering",
        }
    }
}

/// One append-only event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogEvent {
    pub event_name: EventName,
    pub group_id: Option<Uuid>,
    pub display_name: Option<String>,
    pub details: Option<String>,
    pub project_id: Option<i64>,
    pub project_data: Option<Value>,
    pub data: EventData,
    pub created_at: DateTime<Utc>,
}

impl LogEvent {
    /// A new event with the event name's default display name.
    #[must_use]
    pub fn new(event_name: EventName, group_id: Option<Uuid>) -> Self {
        Self {
            event_name,
            group_id,
            display_name: Some(event_name.default_display_name().to_string()),
            details: None,
            project_id: None,
            project_data: None,
            data: EventData::Empty,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub const fn project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub fn project_data(mut self, project_data: Value) -> Self {
        self.project_data = Some(project_data);
        self
    }

    #[must_use]
    pub fn filters(mut self, results: Vec<FilterResult>) -> Self {
        self.data = EventData::Filters(results);
        self
    }

    #[must_use]
    pub fn payload(mut self, value: Value) -> Self {
        self.data = EventData::Json(value);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match (&self.data, self.project_id, &self.project_data) {
            (EventData::Filters(_), _, _) => EventKind::Filtering,
            (_, Some(_), _) | (_, _, Some(_)) => EventKind::Project,
            _ => EventKind::Log,
        }
    }

    /// Filter results carried by a filtering event.
    #[must_use]
    pub fn filter_results(&self) -> &[FilterResult] {
        match &self.data {
            EventData::Filters(results) => results,
            _ => &[],
        }
    }
}

/// Events of one admission attempt, sharing a correlation id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCollector {
    pub group_id: Uuid,
    pub events: Vec<LogEvent>,
}

impl EventCollector {
    /// A collector with a fresh random group id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_group(Uuid::new_v4())
    }

    #[must_use]
    pub const fn with_group(group_id: Uuid) -> Self {
        Self {
            group_id,
            events: Vec::new(),
        }
    }

    /// Start an event stamped with this collector's group id.
    #[must_use]
    pub fn event(&self, event_name: EventName) -> LogEvent {
        LogEvent::new(event_name, Some(self.group_id))
    }

    pub fn push(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn names(&self) -> Vec<EventName> {
        self.events.iter().map(|e| e.event_name).collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn find(&self, event_name: EventName) -> Option<&LogEvent> {
        self.events.iter().find(|e| e.event_name == event_name)
    }

    /// Take the collected events, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kind_is_derived_from_shape() {
        let group = Some(Uuid::new_v4());
        assert_eq!(LogEvent::new(EventName::PublishFailed, group).kind(), EventKind::Log);
        assert_eq!(
            LogEvent::new(EventName::ProjectCreated, group).project(4).kind(),
            EventKind::Project
        );
        assert_eq!(
            LogEvent::new(EventName::FilterSignalFailed, group)
                .project(4)
                .filters(vec![])
                .kind(),
            EventKind::Filtering
        );
    }

    #[test]
    fn collector_stamps_group_id() {
        let mut collector = EventCollector::new();
        let event = collector.event(EventName::NoSignalMatched).details("none matched");
        collector.push(event);

        assert_eq!(collector.events[0].group_id, Some(collector.group_id));
        assert_eq!(collector.names(), vec![EventName::NoSignalMatched]);
        assert_eq!(
            collector.events[0].display_name.as_deref(),
            Some("No signals matched")
        );
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = LogEvent::new(EventName::ValidationFailed, None)
            .payload(json!({"errors": [{"field": "title"}]}));
        let back: LogEvent = serde_json::from_value(serde_json::to_value(&event).unwrap()).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn drain_empties_collector() {
        let mut collector = EventCollector::new();
        collector.push(collector.event(EventName::ProjectUpdated));
        assert_eq!(collector.drain().len(), 1);
        assert!(collector.events.is_empty());
    }
}
