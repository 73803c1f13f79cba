use serde::{Deserialize, Serialize};

/// Direction buttons of the control pad.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Input produced while this direction is held.
    pub fn input(self) -> TeleopInput {
        match self {
            Direction::Forward => TeleopInput::new(1.0, 0.0),
            Direction::Backward => TeleopInput::new(-1.0, 0.0),
            // ROS yaw is counter-clockwise positive.
            Direction::Left => TeleopInput::new(0.0, 1.0),
            Direction::Right => TeleopInput::new(0.0, -1.0),
        }
    }

    fn is_linear(self) -> bool {
        matches!(self, Direction::Forward | Direction::Backward)
    }
}

/// Events produced by the operator's input devices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Joystick offset in widget coordinates, normalized to `[-1, 1]`.
    /// `x` grows to the right and `y` grows downwards.
    JoystickMoved { x: f64, y: f64 },
    JoystickReleased,
    DirectionPressed(Direction),
    DirectionReleased(Direction),
    /// Zero all input.
    Stop,
    EmergencyStop(bool),
    ToggleEmergencyStop,
}

/// Normalized operator intent.
///
/// Both fields are in `[-1, 1]`: `linear` is forward positive and `angular`
/// is counter-clockwise positive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleopInput {
    pub linear: f64,
    pub angular: f64,
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}

impl TeleopInput {
    pub const ZERO: Self = Self {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Converts a joystick offset in screen coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use teleop_core::TeleopInput;
    ///
    /// // up and to the left: forward while turning counter-clockwise
    /// let input = TeleopInput::from_joystick(-0.5, -2.0);
    /// assert_eq!(input, TeleopInput::new(1.0, 0.5));
    /// ```
    pub fn from_joystick(x: f64, y: f64) -> Self {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        Self {
            linear: -clamp_unit(y),
            angular: -clamp_unit(x),
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            linear: clamp_unit(self.linear),
            angular: clamp_unit(self.angular),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }

    /// Applies a held direction on its own axis, keeping the other axis.
    pub(crate) fn press(&mut self, direction: Direction) {
        let target = direction.input();
        if direction.is_linear() {
            self.linear = target.linear;
        } else {
            self.angular = target.angular;
        }
    }

    /// Zeroes the axis driven by `direction`, if it still holds that direction's value.
    pub(crate) fn release(&mut self, direction: Direction) {
        let target = direction.input();
        if direction.is_linear() {
            if self.linear == target.linear {
                self.linear = 0.0;
            }
        } else if self.angular == target.angular {
            self.angular = 0.0;
        }
    }
}
