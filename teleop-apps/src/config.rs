use std::{path::Path, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use teleop_core::{PublisherConfig, VelocityLimits};
use teleop_gui::{ConnectionSettings, PanelConfig};

use crate::Error;

fn default_url() -> String {
    "ws://localhost:9090".to_owned()
}

fn default_cmd_vel_topic() -> String {
    "/cmd_vel".to_owned()
}

fn default_connect_timeout_secs() -> f64 {
    5.0
}

fn default_period_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_width() -> f32 {
    420.0
}

fn default_height() -> f32 {
    720.0
}

/// Where the rosbridge server is and which topic to drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// rosbridge WebSocket URL (`ws://` or `wss://`).
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_cmd_vel_topic")]
    pub cmd_vel_topic: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            cmd_vel_topic: default_cmd_vel_topic(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PublisherSettings {
    /// Interval between two velocity commands in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Keep publishing zero velocity while there is no input.
    #[serde(default = "default_true")]
    pub publish_when_idle: bool,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            publish_when_idle: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GuiConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Configuration shared by the teleop applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TeleopConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub limits: VelocityLimits,
    #[serde(default)]
    pub publisher: PublisherSettings,
    #[serde(default)]
    pub gui: GuiConfig,
}

impl TeleopConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        Self::from_str(
            &fs_err::read_to_string(path).map_err(|e| Error::NoFile(path.to_owned(), e))?,
            path,
        )
    }

    /// Parses `s`. `path` is only used in error messages.
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.limits.validate()?;
        self.connection_settings()?;
        self.publisher_config()?;
        if !(self.gui.width > 0.0 && self.gui.height > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "gui window size must be positive, got {}x{}",
                self.gui.width, self.gui.height
            )));
        }
        Ok(())
    }

    pub fn connection_settings(&self) -> Result<ConnectionSettings, Error> {
        let secs = self.connection.connect_timeout_secs;
        let connect_timeout = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "connection.connect_timeout_secs must be positive seconds, got {secs}"
                ))
            })?;
        let settings = ConnectionSettings {
            url: self.connection.url.clone(),
            cmd_vel_topic: self.connection.cmd_vel_topic.clone(),
            connect_timeout,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn publisher_config(&self) -> Result<PublisherConfig, Error> {
        if self.publisher.period_ms == 0 {
            return Err(Error::InvalidConfig(
                "publisher.period_ms must be greater than zero".to_owned(),
            ));
        }
        Ok(PublisherConfig {
            period: Duration::from_millis(self.publisher.period_ms),
            publish_when_idle: self.publisher.publish_when_idle,
        })
    }

    pub fn panel_config(&self) -> Result<PanelConfig, Error> {
        self.validate()?;
        Ok(PanelConfig {
            connection: self.connection_settings()?,
            limits: self.limits,
            publisher: self.publisher_config()?,
            window_size: [self.gui.width, self.gui.height],
        })
    }
}
