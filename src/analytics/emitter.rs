//! AnalyticsEmitter: in-process event log with optional remote mirroring.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use crate::remote::{TrackEventRequest, WidgetEventType};

use super::delivery::DeliveryQueue;
use super::event::{AnalyticsEvent, NewEvent};
use super::identity::{VisitorIdentity, generate_id};

/// Where remote-mapped events go.
#[derive(Clone)]
pub struct RemoteSink {
    tour_id: String,
    queue: DeliveryQueue,
    identity: VisitorIdentity,
}

impl RemoteSink {
    /// `tour_id` is the backend's id for the tour, reported with each event.
    pub fn new(tour_id: &str, queue: DeliveryQueue, identity: VisitorIdentity) -> Self {
        Self {
            tour_id: tour_id.to_string(),
            queue,
            identity,
        }
    }

    fn send(&self, event_type: WidgetEventType, step_id: Option<String>) {
        self.queue.enqueue(TrackEventRequest {
            tour_id: self.tour_id.clone(),
            event_type,
            step_id,
            session_id: self.identity.session_id(),
            visitor_id: self.identity.visitor_id(),
        });
    }
}

struct Inner {
    events: Vec<AnalyticsEvent>,
    session_id: String,
}

/// Analytics service for one mounted tour.
///
/// Shared by reference between the state machine and the widget handle.
pub struct AnalyticsEmitter {
    inner: Mutex<Inner>,
    remote: Option<RemoteSink>,
}

impl AnalyticsEmitter {
    /// Local-only emitter.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                session_id: generate_id("session"),
            }),
            remote: None,
        }
    }

    /// Emitter that also mirrors events to the backend.
    pub fn with_remote(remote: RemoteSink) -> Self {
        Self {
            remote: Some(remote),
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stamp, record, and (if configured) deliver an event.
    pub fn track(&self, event: NewEvent) {
        let event = event.stamp(Utc::now());
        debug!(
            event_type = %event.event_type,
            step_id = ?event.step_id,
            "Tour analytics event"
        );

        if let (Some(remote), Some(kind)) = (&self.remote, event.event_type.remote_kind()) {
            remote.send(kind, event.step_id.clone());
        }

        self.lock().events.push(event);
    }

    /// Send a backend-only event with no local counterpart (e.g. `view`).
    pub fn track_remote(&self, event_type: WidgetEventType, step_id: Option<&str>) {
        if let Some(remote) = &self.remote {
            remote.send(event_type, step_id.map(str::to_string));
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Snapshot of the log.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.lock().events.clone()
    }

    pub fn session_id(&self) -> String {
        self.lock().session_id.clone()
    }

    /// Clear the log and start a new session.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.events.clear();
        inner.session_id = generate_id("session");
    }
}

impl Default for AnalyticsEmitter {
    fn default() -> Self {
        Self::new()
    }
}
