//! TourStore: best-effort persistence of tour progress and the completed-tour
//! ledger on top of a [`KeyValueStore`].
//!
//! No method here returns an error. Backend failures and corrupt records are
//! logged and degrade to an absent result or a no-op.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::tour::TourState;

use super::traits::KeyValueStore;

/// Storage keys used for tour persistence.
pub mod keys {
    /// Prefix for every tour record.
    pub const PREFIX: &str = "onboarding_tour_";
    /// Suffix of the completed-tour ledger key.
    pub const COMPLETED: &str = "completed";
}

/// Tour progress persistence.
#[derive(Clone)]
pub struct TourStore {
    kv: Arc<dyn KeyValueStore>,
}

impl TourStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn state_key(tour_id: &str) -> String {
        format!("{}{}", keys::PREFIX, tour_id)
    }

    fn completed_key() -> String {
        format!("{}{}", keys::PREFIX, keys::COMPLETED)
    }

    /// Load the saved state for `tour_id`.
    pub fn get(&self, tour_id: &str) -> Option<TourState> {
        let key = Self::state_key(tour_id);
        let raw = match self.kv.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(tour_id = %tour_id, "Failed to read tour state: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(tour_id = %tour_id, "Discarding unparseable tour state: {}", e);
                None
            }
        }
    }

    /// Save `state` for `tour_id`.
    pub fn set(&self, tour_id: &str, state: &TourState) {
        let value = match serde_json::to_string(state) {
            Ok(v) => v,
            Err(e) => {
                warn!(tour_id = %tour_id, "Failed to serialize tour state: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.set(&Self::state_key(tour_id), &value) {
            warn!(tour_id = %tour_id, "Failed to save tour state: {}", e);
        }
    }

    /// Forget the saved state for `tour_id`.
    pub fn remove(&self, tour_id: &str) {
        if let Err(e) = self.kv.remove(&Self::state_key(tour_id)) {
            warn!(tour_id = %tour_id, "Failed to clear tour state: {}", e);
        }
    }

    /// Ids of every tour marked completed, in insertion order.
    fn completed_list(&self) -> Vec<String> {
        let raw = match self.kv.get(&Self::completed_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read completed tours: {}", e);
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding unparseable completed-tour ledger: {}", e);
            Vec::new()
        })
    }

    /// Set of tour ids marked completed.
    pub fn completed_tour_ids(&self) -> BTreeSet<String> {
        self.completed_list().into_iter().collect()
    }

    pub fn is_completed(&self, tour_id: &str) -> bool {
        self.completed_list().iter().any(|id| id == tour_id)
    }

    /// Add `tour_id` to the completed ledger. Idempotent.
    pub fn mark_completed(&self, tour_id: &str) {
        let mut completed = self.completed_list();
        if completed.iter().any(|id| id == tour_id) {
            return;
        }
        completed.push(tour_id.to_string());
        let value = match serde_json::to_string(&completed) {
            Ok(v) => v,
            Err(e) => {
                warn!(tour_id = %tour_id, "Failed to serialize completed tours: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.set(&Self::completed_key(), &value) {
            warn!(tour_id = %tour_id, "Failed to mark tour completed: {}", e);
        }
    }
}
