//! Analytics: local lifecycle event log plus fire-and-forget remote delivery.

pub mod delivery;
pub mod emitter;
pub mod event;
pub mod identity;

pub use delivery::{DeliveryQueue, spawn_delivery_worker};
pub use emitter::{AnalyticsEmitter, RemoteSink};
pub use event::{AnalyticsEvent, AnalyticsEventType, NewEvent};
pub use identity::VisitorIdentity;
