use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("teleop-rosbridge: Invalid url {:?} ({})", .0, .1)]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("teleop-rosbridge: Unsupported url scheme {:?} (expected ws or wss)", .0)]
    UnsupportedScheme(String),
    #[error("teleop-rosbridge: Invalid topic name {:?}", .0)]
    InvalidTopic(String),
    #[error(
        "teleop-rosbridge: Topic {:?} is advertised as {:?}, not {:?}",
        topic, advertised, requested
    )]
    TypeMismatch {
        topic: String,
        advertised: String,
        requested: String,
    },
    #[error("teleop-rosbridge: Connection timed out after {:?}", .0)]
    Timeout(Duration),
    #[error("teleop-rosbridge: WebSocket: {}", .0)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("teleop-rosbridge: JSON: {}", .0)]
    Json(#[from] serde_json::Error),
    #[error("teleop-rosbridge: Not connected")]
    NotConnected,
}

impl From<Error> for teleop_core::Error {
    fn from(e: Error) -> Self {
        teleop_core::Error::Connection {
            message: e.to_string(),
        }
    }
}
