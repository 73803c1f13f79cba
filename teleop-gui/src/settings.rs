use std::{ops::RangeInclusive, time::Duration};

use teleop_core::{PublisherConfig, VelocityLimits};
use teleop_rosbridge::{parse_url, validate_topic};
use tracing::warn;

use crate::Error;

const DEFAULT_URL: &str = "ws://localhost:9090";
const DEFAULT_CMD_VEL_TOPIC: &str = "/cmd_vel";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// Upper bounds of the speed inputs.
const MAX_LINEAR_RANGE: RangeInclusive<f64> = 0.0..=5.0;
const MAX_ANGULAR_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Where and how to reach the robot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    /// rosbridge WebSocket URL, e.g. `ws://robot.local:9090`.
    pub url: String,
    pub cmd_vel_topic: String,
    pub connect_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            cmd_vel_topic: DEFAULT_CMD_VEL_TOPIC.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ConnectionSettings {
    pub fn validate(&self) -> Result<(), Error> {
        parse_url(&self.url).map_err(|e| Error::InvalidSetting("url", e.to_string()))?;
        validate_topic(&self.cmd_vel_topic)
            .map_err(|e| Error::InvalidSetting("cmd_vel_topic", e.to_string()))?;
        Ok(())
    }
}

/// Everything the panel needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub connection: ConnectionSettings,
    pub limits: VelocityLimits,
    pub publisher: PublisherConfig,
    /// Initial window size in points.
    pub window_size: [f32; 2],
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            limits: VelocityLimits::default(),
            publisher: PublisherConfig::default(),
            window_size: [420.0, 720.0],
        }
    }
}

/// Text input bound to a number.
#[derive(Debug)]
pub(crate) struct NumberField {
    pub(crate) name: &'static str,
    pub(crate) input: String,
    pub(crate) value: f64,
    pub(crate) range: RangeInclusive<f64>,
}

impl NumberField {
    fn new(name: &'static str, value: f64, range: RangeInclusive<f64>) -> Self {
        Self {
            name,
            input: format!("{value:.2}"),
            value,
            range,
        }
    }

    /// Parses `input` into `value`. The previous value is kept on error.
    pub(crate) fn commit(&mut self) -> Result<f64, String> {
        match self.input.trim().parse::<f64>() {
            Ok(value) if self.range.contains(&value) => {
                self.value = value;
                Ok(value)
            }
            Ok(_) => {
                let msg = format!("Value for `{}` is out of limit", self.name);
                warn!(input = ?self.input, range = ?self.range, ?msg);
                Err(msg)
            }
            Err(e) => {
                let msg = format!("Value for `{}` is not a valid number", self.name);
                warn!(input = ?self.input, ?msg, "error=\"{e}\"");
                Err(msg)
            }
        }
    }

    /// Sets the value from a slider and refreshes the text.
    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
        self.input = format!("{value:.2}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitField {
    Linear,
    Angular,
}

/// State of the settings form.
///
/// An invalid field is reported but does not discard the other fields.
#[derive(Debug)]
pub(crate) struct SettingsForm {
    pub(crate) url: String,
    pub(crate) cmd_vel_topic: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) max_linear: NumberField,
    pub(crate) max_angular: NumberField,
    pub(crate) field_error: Option<(LimitField, String)>,
}

impl SettingsForm {
    pub(crate) fn new(connection: &ConnectionSettings, limits: VelocityLimits) -> Self {
        Self {
            url: connection.url.clone(),
            cmd_vel_topic: connection.cmd_vel_topic.clone(),
            connect_timeout: connection.connect_timeout,
            max_linear: NumberField::new(
                "max linear (m/s)",
                limits.max_linear,
                MAX_LINEAR_RANGE,
            ),
            max_angular: NumberField::new(
                "max angular (rad/s)",
                limits.max_angular,
                MAX_ANGULAR_RANGE,
            ),
            field_error: None,
        }
    }

    pub(crate) fn field(&mut self, field: LimitField) -> &mut NumberField {
        match field {
            LimitField::Linear => &mut self.max_linear,
            LimitField::Angular => &mut self.max_angular,
        }
    }

    pub(crate) fn connection_settings(&self) -> Result<ConnectionSettings, Error> {
        let settings = ConnectionSettings {
            url: self.url.trim().to_owned(),
            cmd_vel_topic: self.cmd_vel_topic.trim().to_owned(),
            connect_timeout: self.connect_timeout,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn limits(&self) -> Result<VelocityLimits, Error> {
        Ok(VelocityLimits::new(
            self.max_linear.value,
            self.max_angular.value,
        )?)
    }

    /// Commits the text of `field`. Returns the new limits if it parsed.
    pub(crate) fn commit(&mut self, field: LimitField) -> Option<VelocityLimits> {
        match self.field(field).commit() {
            Ok(_) => {
                if matches!(self.field_error, Some((f, _)) if f == field) {
                    self.field_error = None;
                }
                self.limits().ok()
            }
            Err(msg) => {
                self.field_error = Some((field, msg));
                None
            }
        }
    }

    pub(crate) fn set_value(&mut self, field: LimitField, value: f64) -> Option<VelocityLimits> {
        self.field(field).set_value(value);
        if matches!(self.field_error, Some((f, _)) if f == field) {
            self.field_error = None;
        }
        self.limits().ok()
    }

    pub(crate) fn has_error(&self, field: LimitField) -> bool {
        matches!(self.field_error, Some((f, _)) if f == field)
    }
}
