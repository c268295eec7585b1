//! Tour definition resolver: merges the backend's tour document, the
//! caller's partial configuration and the built-in defaults into one
//! [`TourConfig`].
//!
//! Precedence for steps and name: remote > caller > built-in. Presentation
//! fields and listeners only ever come from the caller. The tour id is the
//! remote id, else the caller's, else `"default-tour"`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ConfigError;
use crate::remote::{RemoteTour, TourBackend};

use super::defaults::{DEFAULT_TOUR_ID, DEFAULT_TOUR_NAME};
use super::listener::TourListener;
use super::model::{AvatarPosition, Step, Theme, TourConfig};

/// Caller-supplied configuration; every field optional.
#[derive(Clone, Default)]
pub struct PartialTourConfig {
    pub tour_id: Option<String>,
    pub name: Option<String>,
    pub steps: Option<Vec<Step>>,
    pub show_avatar: Option<bool>,
    pub avatar_position: Option<AvatarPosition>,
    pub theme: Option<Theme>,
    pub listeners: Vec<Arc<dyn TourListener>>,
}

impl PartialTourConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tour_id(mut self, tour_id: &str) -> Self {
        self.tour_id = Some(tour_id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn TourListener>) -> Self {
        self.listeners.push(listener);
        self
    }
}

/// Produce the effective configuration.
///
/// `remote_id` is the backend id the tour was requested under; `remote` is
/// the document it returned, if the fetch succeeded. A remote document with
/// no steps is treated as absent.
pub fn resolve(
    remote_id: Option<&str>,
    remote: Option<&RemoteTour>,
    caller: &PartialTourConfig,
    defaults: &[Step],
) -> Result<TourConfig, ConfigError> {
    let remote = remote.filter(|r| {
        if r.steps.is_empty() {
            warn!(remote_id = ?remote_id, "Remote tour has no steps; ignoring it");
        }
        !r.steps.is_empty()
    });

    let tour_id = remote_id
        .or(caller.tour_id.as_deref())
        .unwrap_or(DEFAULT_TOUR_ID);

    let name = remote
        .and_then(|r| r.name.as_deref())
        .or(caller.name.as_deref())
        .unwrap_or(DEFAULT_TOUR_NAME);

    let steps = remote
        .map(|r| r.steps.as_slice())
        .or(caller.steps.as_deref())
        .unwrap_or(defaults)
        .iter()
        .map(|step| {
            let mut step = step.clone();
            step.placement = Some(step.placement());
            step
        })
        .collect();

    let mut config = TourConfig::new(tour_id, name, steps)?;
    config.show_avatar = caller.show_avatar.unwrap_or(true);
    config.avatar_position = caller.avatar_position.unwrap_or_default();
    config.theme = caller.theme.unwrap_or_default();
    for listener in &caller.listeners {
        config = config.with_listener(Arc::clone(listener));
    }
    Ok(config)
}

/// How long a mount waits for the remote tour document.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch a tour document once, best-effort.
///
/// Any failure, including no answer within `timeout`, is logged and reported
/// as `None` so the caller falls back to its own or the built-in steps.
pub async fn fetch_remote(
    backend: &dyn TourBackend,
    tour_id: &str,
    timeout: Duration,
) -> Option<RemoteTour> {
    let result = match tokio::time::timeout(timeout, backend.fetch_tour(tour_id)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                tour_id = %tour_id,
                timeout_ms = timeout.as_millis() as u64,
                "Remote tour fetch timed out"
            );
            return None;
        }
    };
    match result {
        Ok(Some(tour)) => {
            info!(
                tour_id = %tour_id,
                steps = tour.steps.len(),
                "Loaded remote tour definition"
            );
            Some(tour)
        }
        Ok(None) => {
            warn!(tour_id = %tour_id, "Remote tour not found or inactive");
            None
        }
        Err(e) => {
            warn!(tour_id = %tour_id, "Failed to load remote tour: {}", e);
            None
        }
    }
}
