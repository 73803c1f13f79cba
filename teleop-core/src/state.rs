use std::sync::{Arc, Mutex, MutexGuard};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::Error,
    input::{InputEvent, TeleopInput},
    move_base::BaseVelocity,
};

const DEFAULT_MAX_LINEAR: f64 = 0.5;
const DEFAULT_MAX_ANGULAR: f64 = 1.0;

fn default_max_linear() -> f64 {
    DEFAULT_MAX_LINEAR
}

fn default_max_angular() -> f64 {
    DEFAULT_MAX_ANGULAR
}

/// Gain applied to normalized operator input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VelocityLimits {
    /// Maximum linear speed in m/s.
    #[serde(default = "default_max_linear")]
    pub max_linear: f64,
    /// Maximum angular speed in rad/s.
    #[serde(default = "default_max_angular")]
    pub max_angular: f64,
}

impl Default for VelocityLimits {
    fn default() -> Self {
        Self {
            max_linear: DEFAULT_MAX_LINEAR,
            max_angular: DEFAULT_MAX_ANGULAR,
        }
    }
}

impl VelocityLimits {
    pub fn new(max_linear: f64, max_angular: f64) -> Result<Self, Error> {
        let limits = Self {
            max_linear,
            max_angular,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("max_linear", self.max_linear),
            ("max_angular", self.max_angular),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidLimit { name, value });
            }
        }
        Ok(())
    }

    /// Scales clamped input into a velocity command.
    ///
    /// # Example
    ///
    /// ```
    /// use assert_approx_eq::assert_approx_eq;
    /// use teleop_core::{TeleopInput, VelocityLimits};
    ///
    /// let limits = VelocityLimits::new(0.4, 2.0).unwrap();
    /// let vel = limits.apply(TeleopInput::new(3.0, -0.5));
    /// assert_approx_eq!(vel.x, 0.4);
    /// assert_approx_eq!(vel.theta, -1.0);
    /// ```
    pub fn apply(&self, input: TeleopInput) -> BaseVelocity {
        let input = input.clamped();
        BaseVelocity {
            x: input.linear * self.max_linear,
            y: 0.0,
            theta: input.angular * self.max_angular,
        }
    }

    /// Multiplies both limits, e.g. for speed up/down keys.
    pub fn scaled(&self, factor: f64) -> Result<Self, Error> {
        Self::new(self.max_linear * factor, self.max_angular * factor)
    }
}

/// Operator input, E-stop latch and limits.
#[derive(Debug, Default, Clone)]
pub struct TeleopState {
    input: TeleopInput,
    joystick_active: bool,
    emergency_stopped: bool,
    limits: VelocityLimits,
}

impl TeleopState {
    pub fn new(limits: VelocityLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    pub fn input(&self) -> TeleopInput {
        self.input
    }

    pub fn limits(&self) -> VelocityLimits {
        self.limits
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stopped
    }

    pub fn is_joystick_active(&self) -> bool {
        self.joystick_active
    }

    /// Velocity to publish right now.
    pub fn command(&self) -> BaseVelocity {
        if self.emergency_stopped {
            BaseVelocity::ZERO
        } else {
            self.limits.apply(self.input)
        }
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::JoystickMoved { x, y } => {
                self.joystick_active = true;
                self.input = TeleopInput::from_joystick(x, y);
            }
            InputEvent::JoystickReleased => {
                self.joystick_active = false;
                self.input = TeleopInput::ZERO;
            }
            // The joystick owns the input while it is dragged.
            InputEvent::DirectionPressed(direction) if !self.joystick_active => {
                self.input.press(direction);
            }
            InputEvent::DirectionReleased(direction) if !self.joystick_active => {
                self.input.release(direction);
            }
            InputEvent::DirectionPressed(_) | InputEvent::DirectionReleased(_) => {}
            InputEvent::Stop => {
                self.input = TeleopInput::ZERO;
            }
            InputEvent::EmergencyStop(engaged) => self.set_emergency_stop(engaged),
            InputEvent::ToggleEmergencyStop => self.set_emergency_stop(!self.emergency_stopped),
        }
    }

    fn set_emergency_stop(&mut self, engaged: bool) {
        if engaged == self.emergency_stopped {
            return;
        }
        self.emergency_stopped = engaged;
        // Releasing the latch must not resume the motion that was in progress.
        self.input = TeleopInput::ZERO;
        if engaged {
            info!("emergency stop engaged");
        } else {
            info!("emergency stop released");
        }
    }
}

/// Shared handle to a [`TeleopState`].
///
/// Input producers and the [`VelocityPublisher`](crate::VelocityPublisher)
/// each hold a clone.
#[derive(Debug, Clone, Default)]
pub struct TeleopHandle {
    state: Arc<Mutex<TeleopState>>,
}

impl TeleopHandle {
    pub fn new(limits: VelocityLimits) -> Self {
        Self {
            state: Arc::new(Mutex::new(TeleopState::new(limits))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TeleopState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn apply(&self, event: InputEvent) {
        debug!(?event, "apply");
        self.lock().apply(event);
    }

    pub fn snapshot(&self) -> TeleopState {
        self.lock().clone()
    }

    pub fn input(&self) -> TeleopInput {
        self.lock().input()
    }

    pub fn command(&self) -> BaseVelocity {
        self.lock().command()
    }

    pub fn limits(&self) -> VelocityLimits {
        self.lock().limits()
    }

    pub fn set_limits(&self, limits: VelocityLimits) -> Result<(), Error> {
        limits.validate()?;
        self.lock().limits = limits;
        Ok(())
    }

    pub fn engage_emergency_stop(&self) {
        self.apply(InputEvent::EmergencyStop(true));
    }

    pub fn release_emergency_stop(&self) {
        self.apply(InputEvent::EmergencyStop(false));
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.lock().is_emergency_stopped()
    }
}
