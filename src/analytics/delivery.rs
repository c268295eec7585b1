//! Fire-and-forget delivery of widget events to the backend.
//!
//! Transitions enqueue onto an unbounded channel and return immediately. A
//! single worker task drains the channel in order. Failed deliveries are
//! logged and dropped, never retried.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::remote::{TourBackend, TrackEventRequest};

/// Sending half of the delivery channel.
#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::UnboundedSender<TrackEventRequest>,
}

impl DeliveryQueue {
    /// Create a queue and the receiver a worker should drain.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TrackEventRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an event. Never blocks; drops the event if the worker is gone.
    pub fn enqueue(&self, request: TrackEventRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!(
                event_type = %e.0.event_type,
                "Delivery worker stopped; dropping widget event"
            );
        }
    }
}

/// Spawn the worker that delivers queued events to `backend`.
///
/// The worker exits once every [`DeliveryQueue`] clone has been dropped.
pub fn spawn_delivery_worker(backend: Arc<dyn TourBackend>) -> (DeliveryQueue, JoinHandle<()>) {
    let (queue, mut rx) = DeliveryQueue::new();
    let handle = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            if let Err(e) = backend.track_event(&request).await {
                error!(
                    tour_id = %request.tour_id,
                    event_type = %request.event_type,
                    "Widget event delivery failed: {}",
                    e
                );
            }
        }
    });
    (queue, handle)
}
