use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("teleop-gui: teleop-core: {}", .0)]
    Core(#[from] teleop_core::Error),
    #[error("teleop-gui: teleop-rosbridge: {}", .0)]
    Rosbridge(#[from] teleop_rosbridge::Error),
    #[error("teleop-gui: invalid setting `{}`: {}", .0, .1)]
    InvalidSetting(&'static str, String),
    #[error("teleop-gui: other: {}", .0)]
    Other(String),
}
