use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("teleop-core: Connection error : {}", message)]
    Connection { message: String },
    #[error("teleop-core: Uninitialized : {}", message)]
    Uninitialized { message: String },
    #[error("teleop-core: Invalid limit: {}={} (must be finite and non-negative)", name, value)]
    InvalidLimit { name: &'static str, value: f64 },
    #[error("teleop-core: Other: {:?}", .0)]
    Other(#[from] anyhow::Error),
}
