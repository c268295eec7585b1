//! Session and visitor identifiers attached to remote events.
//!
//! The session id lives in a session-scoped store, the visitor id in a
//! durable one. Both are created on first use and reused afterwards.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::KeyValueStore;

/// Storage keys for identifiers.
pub mod keys {
    pub const SESSION_ID: &str = "tour_session_id";
    pub const VISITOR_ID: &str = "tour_visitor_id";
}

/// Build an id of the form `<prefix>_<epoch millis>_<9 random chars>`.
pub fn generate_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

/// Lazily created, persisted identifiers.
#[derive(Clone)]
pub struct VisitorIdentity {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
}

impl VisitorIdentity {
    pub fn new(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { session, durable }
    }

    pub fn session_id(&self) -> String {
        get_or_create(self.session.as_ref(), keys::SESSION_ID, "session")
    }

    pub fn visitor_id(&self) -> String {
        get_or_create(self.durable.as_ref(), keys::VISITOR_ID, "visitor")
    }
}

fn get_or_create(store: &dyn KeyValueStore, key: &str, prefix: &str) -> String {
    match store.get(key) {
        Ok(Some(id)) if !id.is_empty() => return id,
        Ok(_) => {}
        Err(e) => warn!(key = %key, "Failed to read identifier: {}", e),
    }

    let id = generate_id(prefix);
    if let Err(e) = store.set(key, &id) {
        warn!(key = %key, "Failed to persist identifier: {}", e);
    } else {
        info!(key = %key, id = %id, "Created new identifier");
    }
    id
}
