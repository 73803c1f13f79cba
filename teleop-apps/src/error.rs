use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("teleop-apps: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("teleop-apps: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("teleop-apps: Failed to apply config override {:?}: {}", .0, .1)]
    Overwrite(String, String),
    #[error("teleop-apps: Invalid config: {}", .0)]
    InvalidConfig(String),
    #[error("teleop-apps: Terminal error ({}).", .0)]
    Terminal(#[source] std::io::Error),
    #[error("teleop-apps: teleop-core: {:?}", .0)]
    Core(#[from] teleop_core::Error),
    #[error("teleop-apps: teleop-rosbridge: {:?}", .0)]
    Rosbridge(#[from] teleop_rosbridge::Error),
    #[error("teleop-apps: teleop-gui: {:?}", .0)]
    Gui(#[from] teleop_gui::Error),
}
