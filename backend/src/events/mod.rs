//! Analytics events and user-facing notifications.

#[cfg(test)]
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

/// Receiver for analytics events. Calls never fail and never block the
/// caller on delivery.
pub trait EventSink: Send + Sync {
    fn track_event(&self, name: &str, params: Value);
}

/// Writes events to the `analytics` tracing target.
#[derive(Debug, Default)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn track_event(&self, name: &str, params: Value) {
        tracing::info!(target: "analytics", event = name, %params, "Tracked event");
    }
}

/// Keeps every event in memory, for inspection.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(String, Value)>>,
}

#[cfg(test)]
impl RecordingEvents {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
impl EventSink for RecordingEvents {
    fn track_event(&self, name: &str, params: Value) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.to_string(), params));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
}

/// Transient message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Info,
        }
    }
}
