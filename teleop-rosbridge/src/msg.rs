//! ROS message types sent through rosbridge.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use teleop_core::BaseVelocity;

/// A message with a known ROS type name.
pub trait RosMessage: Serialize + DeserializeOwned {
    /// e.g. `geometry_msgs/Twist`
    const TYPE_NAME: &'static str;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// `geometry_msgs/Twist`
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl RosMessage for Twist {
    const TYPE_NAME: &'static str = "geometry_msgs/Twist";
}

impl From<&BaseVelocity> for Twist {
    fn from(velocity: &BaseVelocity) -> Self {
        let mut twist = Twist::default();
        twist.linear.x = velocity.x;
        twist.linear.y = velocity.y;
        twist.angular.z = velocity.theta;
        twist
    }
}

impl From<&Twist> for BaseVelocity {
    fn from(twist: &Twist) -> Self {
        BaseVelocity::new(twist.linear.x, twist.linear.y, twist.angular.z)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_twist_from_velocity() {
        let twist = Twist::from(&BaseVelocity::new(0.3, -0.1, 1.2));
        assert_approx_eq!(twist.linear.x, 0.3);
        assert_approx_eq!(twist.linear.y, -0.1);
        assert_approx_eq!(twist.linear.z, 0.0);
        assert_approx_eq!(twist.angular.x, 0.0);
        assert_approx_eq!(twist.angular.y, 0.0);
        assert_approx_eq!(twist.angular.z, 1.2);
        assert_eq!(
            BaseVelocity::from(&twist),
            BaseVelocity::new(0.3, -0.1, 1.2)
        );
    }

    #[test]
    fn test_twist_json_layout() {
        let twist = Twist::from(&BaseVelocity::new(0.5, 0.0, -1.0));
        assert_eq!(
            serde_json::to_value(twist).unwrap(),
            json!({
                "linear": { "x": 0.5, "y": 0.0, "z": 0.0 },
                "angular": { "x": 0.0, "y": 0.0, "z": -1.0 },
            })
        );
    }
}
