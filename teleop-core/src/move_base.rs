use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Velocity command for a mobile base.
///
/// `x` and `y` are linear velocities in m/s, `theta` is the yaw rate in rad/s
/// (counter-clockwise positive).
#[derive(Clone, Debug, Default, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseVelocity {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl BaseVelocity {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        theta: 0.0,
    };

    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.theta == 0.0
    }
}

/// Multiply scalar value for velocity
///
/// # Example
///
/// ```
/// use assert_approx_eq::assert_approx_eq;
/// use teleop_core::BaseVelocity;
///
/// let vel = BaseVelocity::new(0.1, -0.2, 1.0);
/// let twice = vel * 2.0;
/// assert_approx_eq!(twice.x, 0.2);
/// assert_approx_eq!(twice.y, -0.4);
/// assert_approx_eq!(twice.theta, 2.0);
/// ```
impl std::ops::Mul<f64> for BaseVelocity {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            theta: self.theta * rhs,
        }
    }
}

/// Sink for velocity commands.
#[auto_impl(&, Box, Rc, Arc)]
pub trait MoveBase {
    fn send_velocity(&self, velocity: &BaseVelocity) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zero() {
        assert!(BaseVelocity::default().is_zero());
        assert!(BaseVelocity::ZERO.is_zero());
        assert!(!BaseVelocity::new(0.0, 0.0, -0.1).is_zero());
        assert!((BaseVelocity::new(0.3, 0.0, 0.2) * 0.0).is_zero());
    }
}
