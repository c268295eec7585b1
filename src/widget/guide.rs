//! `TourGuide`: the host-facing namespace: `init`, `start`, `stop`.

use tracing::{info, warn};

use crate::config::WidgetConfig;
use crate::error::{Error, TourError};

use super::handle::{WidgetDeps, WidgetHandle, mount};

/// One widget per page, created by [`TourGuide::init`].
pub struct TourGuide {
    deps: WidgetDeps,
    app: Option<WidgetHandle>,
}

impl TourGuide {
    pub fn new(deps: WidgetDeps) -> Self {
        Self { deps, app: None }
    }

    /// Mount the widget. A second `init` keeps the existing widget.
    pub async fn init(&mut self, config: WidgetConfig) -> Result<(), Error> {
        if let Some(app) = &self.app {
            if !app.is_destroyed() {
                warn!(
                    tour_id = %app.widget_config().tour_id,
                    "TourGuide already initialized; ignoring init"
                );
                return Ok(());
            }
        }
        let handle = mount(config, self.deps.clone()).await?;
        self.app = Some(handle);
        Ok(())
    }

    /// Initialize from embedding script-tag attributes.
    pub async fn init_from_attributes<'a, I>(&mut self, attributes: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let config = WidgetConfig::from_attributes(attributes)?;
        info!(tour_id = %config.tour_id, "Auto-initializing from attributes");
        self.init(config).await
    }

    pub fn is_initialized(&self) -> bool {
        self.app.is_some()
    }

    pub fn start(&mut self) -> Result<bool, TourError> {
        self.app_mut()?.start()
    }

    pub fn stop(&mut self) -> Result<bool, TourError> {
        self.app_mut()?.stop()
    }

    pub fn app(&self) -> Result<&WidgetHandle, TourError> {
        self.app.as_ref().ok_or(TourError::NotInitialized)
    }

    pub fn app_mut(&mut self) -> Result<&mut WidgetHandle, TourError> {
        self.app.as_mut().ok_or(TourError::NotInitialized)
    }
}
