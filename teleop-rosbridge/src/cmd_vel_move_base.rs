use teleop_core::{BaseVelocity, MoveBase};

use crate::{msg::Twist, Publisher, RosbridgeClient};

/// `teleop_core::MoveBase` implementation publishing `geometry_msgs/Twist`
/// through rosbridge.
#[derive(Debug)]
pub struct RosbridgeCmdVelMoveBase {
    publisher: Publisher<Twist>,
}

impl RosbridgeCmdVelMoveBase {
    /// Advertises `cmd_topic_name` on the given session.
    pub fn new(client: &RosbridgeClient, cmd_topic_name: &str) -> Result<Self, crate::Error> {
        Ok(Self {
            publisher: client.advertise(cmd_topic_name)?,
        })
    }

    pub fn topic(&self) -> &str {
        self.publisher.topic()
    }
}

impl MoveBase for RosbridgeCmdVelMoveBase {
    fn send_velocity(&self, velocity: &BaseVelocity) -> Result<(), teleop_core::Error> {
        let twist_msg = Twist::from(velocity);
        self.publisher
            .publish(&twist_msg)
            .map_err(|e| teleop_core::Error::Connection {
                message: format!("rosbridge publish error: {e}"),
            })
    }
}
