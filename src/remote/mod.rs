//! Remote tour backend: fetches tour definitions and ingests widget events.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::tour::Step;

pub use http::HttpBackend;

/// Tour document as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTour {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

/// Event kinds the backend's `trackWidgetEvent` mutation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetEventType {
    View,
    Start,
    Complete,
    Skip,
    StepView,
}

impl std::fmt::Display for WidgetEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::View => "view",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Skip => "skip",
            Self::StepView => "step_view",
        };
        write!(f, "{s}")
    }
}

/// Arguments of the `trackWidgetEvent` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub tour_id: String,
    pub event_type: WidgetEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub session_id: String,
    pub visitor_id: String,
}

/// Backend that stores tour definitions and ingests analytics.
#[async_trait]
pub trait TourBackend: Send + Sync {
    /// Fetch a tour by id. `Ok(None)` means the backend has no such tour.
    async fn fetch_tour(&self, tour_id: &str) -> Result<Option<RemoteTour>, RemoteError>;

    /// Record one widget event.
    async fn track_event(&self, request: &TrackEventRequest) -> Result<(), RemoteError>;
}
