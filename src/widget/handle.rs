//! Mounting a widget: resolve its tour once, then start/stop sessions on it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::analytics::{
    AnalyticsEmitter, AnalyticsEventType, NewEvent, RemoteSink, VisitorIdentity,
    spawn_delivery_worker,
};
use crate::config::WidgetConfig;
use crate::error::{ConfigError, TourError};
use crate::remote::{HttpBackend, TourBackend, WidgetEventType};
use crate::store::{KeyValueStore, MemoryStore, TourStore};
use crate::tour::{
    DEFAULT_FETCH_TIMEOUT, PartialTourConfig, TourConfig, TourListener, TourMachine, TourPhase,
    TourSnapshot, default_steps, fetch_remote, resolve,
};

/// Collaborators a widget is mounted with.
#[derive(Clone)]
pub struct WidgetDeps {
    /// Durable storage: tour progress, completed ledger, visitor id.
    pub durable: Arc<dyn KeyValueStore>,
    /// Session-scoped storage: session id.
    pub session: Arc<dyn KeyValueStore>,
    /// Backend to use instead of one built from `WidgetConfig::endpoint`.
    pub backend: Option<Arc<dyn TourBackend>>,
    pub listeners: Vec<Arc<dyn TourListener>>,
    /// Upper bound on the mount-time tour fetch.
    pub fetch_timeout: Duration,
}

impl WidgetDeps {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            session,
            backend: None,
            listeners: Vec::new(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Both scopes in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn with_backend(mut self, backend: Arc<dyn TourBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn TourListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// A mounted widget.
///
/// The tour configuration is resolved once at mount and reused by every
/// session started on this handle.
pub struct WidgetHandle {
    widget_config: WidgetConfig,
    tour_config: TourConfig,
    store: TourStore,
    analytics: Arc<AnalyticsEmitter>,
    machine: Option<TourMachine>,
    destroyed: bool,
}

/// Mount a widget for `config`.
///
/// With a backend (explicit or from `config.endpoint`) the tour definition is
/// fetched once, best-effort and bounded by `deps.fetch_timeout`, and events
/// are mirrored to it. The returned handle is already started when
/// `config.auto_start` is set.
pub async fn mount(config: WidgetConfig, deps: WidgetDeps) -> Result<WidgetHandle, ConfigError> {
    if config.tour_id.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            key: "tourId".to_string(),
            hint: "A widget needs the id of the tour to run.".to_string(),
        });
    }

    let backend: Option<Arc<dyn TourBackend>> = deps.backend.clone().or_else(|| {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Arc::new(HttpBackend::new(endpoint)) as Arc<dyn TourBackend>)
    });

    let (remote, analytics) = match &backend {
        Some(backend) => {
            let remote = fetch_remote(backend.as_ref(), &config.tour_id, deps.fetch_timeout).await;
            let (queue, _worker) = spawn_delivery_worker(Arc::clone(backend));
            let identity = VisitorIdentity::new(Arc::clone(&deps.session), Arc::clone(&deps.durable));
            let analytics = AnalyticsEmitter::with_remote(RemoteSink::new(
                &config.tour_id,
                queue,
                identity,
            ));
            if remote.is_some() {
                analytics.track_remote(WidgetEventType::View, None);
            }
            (remote, analytics)
        }
        None => (None, AnalyticsEmitter::new()),
    };

    let caller = PartialTourConfig {
        listeners: deps.listeners.clone(),
        ..config.partial_tour_config()
    };
    let remote_id = backend.as_ref().map(|_| config.tour_id.as_str());
    let defaults = default_steps();
    let tour_config = match resolve(remote_id, remote.as_ref(), &caller, &defaults) {
        Err(e) if remote.is_some() => {
            warn!(tour_id = %config.tour_id, "Remote tour rejected: {}", e);
            resolve(remote_id, None, &caller, &defaults)?
        }
        resolved => resolved?,
    };

    info!(
        tour_id = %tour_config.tour_id(),
        steps = tour_config.step_count(),
        remote = backend.is_some(),
        "Widget mounted"
    );

    let mut handle = WidgetHandle {
        widget_config: config,
        tour_config,
        store: TourStore::new(Arc::clone(&deps.durable)),
        analytics: Arc::new(analytics),
        machine: None,
        destroyed: false,
    };

    if handle.widget_config.auto_start {
        // A fresh handle is never destroyed.
        let _ = handle.start();
    }
    Ok(handle)
}

impl WidgetHandle {
    fn ensure_alive(&self) -> Result<(), TourError> {
        if self.destroyed {
            return Err(TourError::Destroyed {
                tour_id: self.tour_config.tour_id().to_string(),
            });
        }
        Ok(())
    }

    /// Begin a session. Returns `false` if one is already running.
    pub fn start(&mut self) -> Result<bool, TourError> {
        self.ensure_alive()?;
        if self.phase() != TourPhase::NotStarted {
            return Ok(false);
        }
        self.analytics.reset();
        self.machine = Some(TourMachine::open(
            self.tour_config.clone(),
            self.store.clone(),
            Arc::clone(&self.analytics),
        ));
        Ok(true)
    }

    /// End the running session. Tour progress stays in the store.
    pub fn stop(&mut self) -> Result<bool, TourError> {
        self.ensure_alive()?;
        if self.machine.take().is_none() {
            return Ok(false);
        }
        self.analytics
            .track(NewEvent::new(AnalyticsEventType::TourStopped));
        info!(tour_id = %self.tour_config.tour_id(), "Widget stopped");
        Ok(true)
    }

    /// Stop and retire the handle. Every later call fails with
    /// [`TourError::Destroyed`].
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = self.stop() {
            warn!("Stop during destroy failed: {}", e);
        }
        self.destroyed = true;
        info!(tour_id = %self.tour_config.tour_id(), "Widget destroyed");
    }

    pub fn is_started(&self) -> bool {
        self.machine.is_some()
    }

    /// `NotStarted` until a session runs, then the session's phase.
    pub fn phase(&self) -> TourPhase {
        self.machine
            .as_ref()
            .map_or(TourPhase::NotStarted, TourMachine::phase)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The running session's machine.
    pub fn machine(&self) -> Result<&TourMachine, TourError> {
        self.ensure_alive()?;
        self.machine.as_ref().ok_or_else(|| self.not_started())
    }

    pub fn machine_mut(&mut self) -> Result<&mut TourMachine, TourError> {
        self.ensure_alive()?;
        let tour_id = self.tour_config.tour_id().to_string();
        self.machine
            .as_mut()
            .ok_or(TourError::NotStarted { tour_id })
    }

    pub fn snapshot(&self) -> Result<TourSnapshot, TourError> {
        Ok(self.machine()?.snapshot())
    }

    pub fn tour_config(&self) -> &TourConfig {
        &self.tour_config
    }

    pub fn widget_config(&self) -> &WidgetConfig {
        &self.widget_config
    }

    pub fn analytics(&self) -> &Arc<AnalyticsEmitter> {
        &self.analytics
    }

    fn not_started(&self) -> TourError {
        TourError::NotStarted {
            tour_id: self.tour_config.tour_id().to_string(),
        }
    }
}
