//! Analytics event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::remote::WidgetEventType;

/// Lifecycle events recorded in the local analytics log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    TourStarted,
    StepViewed,
    StepCompleted,
    StepSkipped,
    TourCompleted,
    TourSkipped,
    TourStopped,
}

impl AnalyticsEventType {
    /// The backend event this maps to, if it is reported remotely at all.
    pub fn remote_kind(&self) -> Option<WidgetEventType> {
        match self {
            Self::TourStarted => Some(WidgetEventType::Start),
            Self::StepViewed => Some(WidgetEventType::StepView),
            Self::TourCompleted => Some(WidgetEventType::Complete),
            Self::TourSkipped => Some(WidgetEventType::Skip),
            Self::StepCompleted | Self::StepSkipped | Self::TourStopped => None,
        }
    }
}

impl std::fmt::Display for AnalyticsEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TourStarted => "tour_started",
            Self::StepViewed => "step_viewed",
            Self::StepCompleted => "step_completed",
            Self::StepSkipped => "step_skipped",
            Self::TourCompleted => "tour_completed",
            Self::TourSkipped => "tour_skipped",
            Self::TourStopped => "tour_stopped",
        };
        write!(f, "{s}")
    }
}

/// An event as recorded, with its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub event_type: AnalyticsEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An event before the emitter stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: AnalyticsEventType,
    pub step_id: Option<String>,
    pub step_index: Option<usize>,
    pub metadata: Option<serde_json::Value>,
}

impl NewEvent {
    pub fn new(event_type: AnalyticsEventType) -> Self {
        Self {
            event_type,
            step_id: None,
            step_index: None,
            metadata: None,
        }
    }

    pub fn with_step(mut self, step_id: &str, step_index: usize) -> Self {
        self.step_id = Some(step_id.to_string());
        self.step_index = Some(step_index);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn stamp(self, timestamp: DateTime<Utc>) -> AnalyticsEvent {
        AnalyticsEvent {
            event_type: self.event_type,
            step_id: self.step_id,
            step_index: self.step_index,
            timestamp,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        use AnalyticsEventType::*;
        let all = [
            TourStarted,
            StepViewed,
            StepCompleted,
            StepSkipped,
            TourCompleted,
            TourSkipped,
            TourStopped,
        ];
        for kind in all {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(format!("\"{kind}\""), json);
        }
    }

    #[test]
    fn remote_mapping() {
        use AnalyticsEventType::*;
        assert_eq!(TourStarted.remote_kind(), Some(WidgetEventType::Start));
        assert_eq!(StepViewed.remote_kind(), Some(WidgetEventType::StepView));
        assert_eq!(TourCompleted.remote_kind(), Some(WidgetEventType::Complete));
        assert_eq!(TourSkipped.remote_kind(), Some(WidgetEventType::Skip));
        assert!(StepCompleted.remote_kind().is_none());
        assert!(TourStopped.remote_kind().is_none());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let event = NewEvent::new(AnalyticsEventType::StepCompleted)
            .with_step("welcome", 0)
            .stamp(ts);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "step_completed");
        assert_eq!(json["stepId"], "welcome");
        assert_eq!(json["stepIndex"], 0);
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert!(json.get("metadata").is_none());
    }
}
