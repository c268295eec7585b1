//! Tour definition models: steps and the resolved tour configuration.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::listener::TourListener;

/// Where a step card is anchored relative to its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        };
        write!(f, "{s}")
    }
}

/// Which side of the card the avatar sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarPosition {
    #[default]
    Left,
    Right,
}

/// Colour scheme of the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

impl std::str::FromStr for AvatarPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!(
                "unknown avatar position '{other}' (expected left or right)"
            )),
        }
    }
}

/// Optional call-to-action button on a step.
///
/// Pressing it is reported through [`TourListener::on_action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAction {
    pub label: String,
}

/// One unit of a tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Selector of the element to highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<StepAction>,
}

impl Step {
    /// Create a step with only the required fields set.
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            target: None,
            placement: None,
            image: None,
            action: None,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    pub fn with_action(mut self, label: &str) -> Self {
        self.action = Some(StepAction {
            label: label.to_string(),
        });
        self
    }

    /// Effective placement (unset means bottom).
    pub fn placement(&self) -> Placement {
        self.placement.unwrap_or_default()
    }
}

/// The effective, read-only configuration of one tour session.
///
/// Built by the resolver. `steps` is guaranteed non-empty with unique ids.
#[derive(Clone)]
pub struct TourConfig {
    tour_id: String,
    name: String,
    steps: Vec<Step>,
    pub show_avatar: bool,
    pub avatar_position: AvatarPosition,
    pub theme: Theme,
    listeners: Vec<Arc<dyn TourListener>>,
}

impl TourConfig {
    /// Build a config, validating the step list.
    pub fn new(tour_id: &str, name: &str, steps: Vec<Step>) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::EmptyTour {
                tour_id: tour_id.to_string(),
            });
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ConfigError::DuplicateStep {
                    tour_id: tour_id.to_string(),
                    step_id: step.id.clone(),
                });
            }
        }
        Ok(Self {
            tour_id: tour_id.to_string(),
            name: name.to_string(),
            steps,
            show_avatar: true,
            avatar_position: AvatarPosition::default(),
            theme: Theme::default(),
            listeners: Vec::new(),
        })
    }

    pub fn with_listener(mut self, listener: Arc<dyn TourListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn tour_id(&self) -> &str {
        &self.tour_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn TourListener>] {
        &self.listeners
    }
}

impl std::fmt::Debug for TourConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourConfig")
            .field("tour_id", &self.tour_id)
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("show_avatar", &self.show_avatar)
            .field("avatar_position", &self.avatar_position)
            .field("theme", &self.theme)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Serializable view of a config, for status endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourConfigView {
    pub tour_id: String,
    pub name: String,
    pub steps: Vec<Step>,
    pub show_avatar: bool,
    pub avatar_position: AvatarPosition,
    pub theme: Theme,
}

impl From<&TourConfig> for TourConfigView {
    fn from(config: &TourConfig) -> Self {
        Self {
            tour_id: config.tour_id.clone(),
            name: config.name.clone(),
            steps: config.steps.clone(),
            show_avatar: config.show_avatar,
            avatar_position: config.avatar_position,
            theme: config.theme,
        }
    }
}
