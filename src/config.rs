//! Configuration types.
//!
//! A [`WidgetConfig`] can be built in code, parsed from the `data-*`
//! attributes of an embedding script tag, or read from `TOUR_GUIDE_*`
//! environment variables. All three share the same field names and defaults.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tour::{AvatarPosition, PartialTourConfig, Theme};

/// Corner of the page the widget is anchored to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    #[default]
    BottomRight,
    BottomLeft,
    Center,
}

impl FromStr for WidgetPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom-right" => Ok(Self::BottomRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "center" => Ok(Self::Center),
            other => Err(format!(
                "unknown position '{other}' (expected bottom-right, bottom-left or center)"
            )),
        }
    }
}

/// Configuration of one embedded widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Backend id of the tour to run.
    pub tour_id: String,
    /// Start the tour as soon as it is mounted.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub position: WidgetPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_avatar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_position: Option<AvatarPosition>,
    /// Base URL of the tour backend. Remote definitions and event tracking
    /// are only used when this is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Field names shared by the attribute and environment sources.
mod fields {
    pub const TOUR_ID: &str = "tour-id";
    pub const AUTO_START: &str = "auto-start";
    pub const THEME: &str = "theme";
    pub const POSITION: &str = "position";
    pub const SHOW_AVATAR: &str = "show-avatar";
    pub const AVATAR_POSITION: &str = "avatar-position";
    pub const ENDPOINT: &str = "endpoint";
}

impl WidgetConfig {
    /// Config with every optional field at its default.
    pub fn new(tour_id: &str) -> Self {
        Self {
            tour_id: tour_id.to_string(),
            auto_start: true,
            theme: Theme::default(),
            position: WidgetPosition::default(),
            show_avatar: None,
            avatar_position: None,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Parse the `data-*` attributes of an embedding script tag.
    ///
    /// `data-tour-id` is required. `data-auto-start` and `data-show-avatar`
    /// are true unless literally `"false"`.
    pub fn from_attributes<'a, I>(attributes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let attributes: Vec<(&str, &str)> = attributes.into_iter().collect();
        Self::from_lookup(
            |field| {
                let name = format!("data-{field}");
                attributes
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| v.to_string())
            },
            |field| format!("data-{field}"),
        )
    }

    /// Read `TOUR_GUIDE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|field| std::env::var(env_key(field)).ok(), env_key)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        source_name: impl Fn(&str) -> String,
    ) -> Result<Self, ConfigError> {
        let get = |field: &str| lookup(field).filter(|v| !v.trim().is_empty());

        let tour_id = get(fields::TOUR_ID).ok_or_else(|| ConfigError::MissingRequired {
            key: source_name(fields::TOUR_ID),
            hint: "Set it to the id of the tour to run.".to_string(),
        })?;

        let mut config = Self::new(tour_id.trim());
        config.auto_start = get(fields::AUTO_START).is_none_or(|v| v.trim() != "false");

        if let Some(theme) = get(fields::THEME) {
            config.theme = parse_value(&source_name(fields::THEME), &theme)?;
        }
        if let Some(position) = get(fields::POSITION) {
            config.position = parse_value(&source_name(fields::POSITION), &position)?;
        }
        if let Some(show) = get(fields::SHOW_AVATAR) {
            config.show_avatar = Some(show.trim() != "false");
        }
        if let Some(pos) = get(fields::AVATAR_POSITION) {
            config.avatar_position =
                Some(parse_value(&source_name(fields::AVATAR_POSITION), &pos)?);
        }
        config.endpoint = get(fields::ENDPOINT).map(|e| e.trim().to_string());
        Ok(config)
    }

    /// The caller-side tour configuration this widget contributes.
    pub fn partial_tour_config(&self) -> PartialTourConfig {
        PartialTourConfig {
            tour_id: Some(self.tour_id.clone()),
            theme: Some(self.theme),
            show_avatar: self.show_avatar,
            avatar_position: self.avatar_position,
            ..PartialTourConfig::default()
        }
    }
}

fn env_key(field: &str) -> String {
    format!("TOUR_GUIDE_{}", field.to_uppercase().replace('-', "_"))
}

fn parse_value<T: FromStr<Err = String>>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|message| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })
}

/// Settings of the `tour-guide` binary.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory of the durable file store.
    pub state_dir: PathBuf,
    /// Port of the HTTP control routes, if they should be served.
    pub http_port: Option<u16>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./data/tour-state"),
            http_port: None,
        }
    }
}

impl RunnerConfig {
    /// Read `TOUR_GUIDE_STATE_DIR` and `TOUR_GUIDE_HTTP_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("TOUR_GUIDE_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }
        if let Ok(port) = std::env::var("TOUR_GUIDE_HTTP_PORT") {
            let port = port.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "TOUR_GUIDE_HTTP_PORT".to_string(),
                message: format!("{e}"),
            })?;
            config.http_port = Some(port);
        }
        Ok(config)
    }
}
