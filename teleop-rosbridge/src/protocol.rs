use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Severity of a rosbridge `status` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
    None,
}

/// A rosbridge v2 protocol operation, tagged by its `op` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Advertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
    },
    Unadvertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
    },
    Publish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        msg: Value,
    },
    Subscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        msg_type: Option<String>,
        /// Minimum interval between messages in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        throttle_rate: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue_length: Option<u32>,
    },
    Unsubscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
    },
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        level: StatusLevel,
        msg: String,
    },
}

impl Operation {
    pub fn op_name(&self) -> &'static str {
        match self {
            Operation::Advertise { .. } => "advertise",
            Operation::Unadvertise { .. } => "unadvertise",
            Operation::Publish { .. } => "publish",
            Operation::Subscribe { .. } => "subscribe",
            Operation::Unsubscribe { .. } => "unsubscribe",
            Operation::Status { .. } => "status",
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Checks that `topic` can be used as a ROS topic name.
pub fn validate_topic(topic: &str) -> Result<(), Error> {
    if topic.is_empty() || topic.chars().any(char::is_whitespace) {
        return Err(Error::InvalidTopic(topic.to_owned()));
    }
    Ok(())
}
