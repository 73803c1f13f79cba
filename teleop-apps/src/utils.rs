use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::{overwrite_str, Error, TeleopConfig};

const TELEOP_CONFIG_ENV_NAME: &str = "TELEOP_CONFIG_PATH";

/// Get config path from input or env TELEOP_CONFIG_PATH
pub fn get_config_path(config_path: Option<PathBuf>) -> Option<PathBuf> {
    config_path.or_else(|| {
        std::env::var(TELEOP_CONFIG_ENV_NAME)
            .map(|s| {
                warn!("### ENV VAR {s} is used ###");
                PathBuf::from(s)
            })
            .ok()
    })
}

/// Loads the config file (or the default config) and applies `overwrite`.
pub fn resolve_config(
    config_path: Option<&Path>,
    overwrite: Option<&str>,
) -> Result<TeleopConfig, Error> {
    let config = match (config_path, overwrite) {
        (Some(path), Some(overwrite)) => {
            let s = &fs_err::read_to_string(path).map_err(|e| Error::NoFile(path.to_owned(), e))?;
            let s = &overwrite_str(s, overwrite)?;
            TeleopConfig::from_str(s, path)?
        }
        (Some(path), None) => TeleopConfig::new(path)?,
        (None, Some(overwrite)) => {
            let s = &toml::to_string(&TeleopConfig::default())
                .map_err(|e| Error::Overwrite(overwrite.to_owned(), e.to_string()))?;
            let s = &overwrite_str(s, overwrite)?;
            TeleopConfig::from_str(s, "--config")?
        }
        (None, None) => TeleopConfig::default(),
    };
    debug!(?config);
    Ok(config)
}

/// Initializes `tracing` with `RUST_LOG`, defaulting to `info`.
///
/// Logs go to stderr so they do not mix with the terminal UI of
/// `teleop_keyboard`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_get_config_path() {
        let path = get_config_path(Some(PathBuf::from("a.toml")));
        assert_eq!(path, Some(PathBuf::from("a.toml")));

        std::env::set_var(TELEOP_CONFIG_ENV_NAME, "b.toml");
        let path = get_config_path(Some(PathBuf::from("a.toml")));
        assert_eq!(path, Some(PathBuf::from("a.toml")));
        let path = get_config_path(None);
        assert_eq!(path, Some(PathBuf::from("b.toml")));
        std::env::remove_var(TELEOP_CONFIG_ENV_NAME);

        let path = get_config_path(None);
        assert!(path.is_none());
    }

    #[test]
    fn test_resolve_config() {
        let config = resolve_config(None, None).unwrap();
        assert_eq!(config, TeleopConfig::default());

        let config = resolve_config(None, Some("limits.max_linear = 0.25")).unwrap();
        assert_approx_eq!(config.limits.max_linear, 0.25);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\ncmd_vel_topic = \"/base/cmd_vel\"").unwrap();
        let config = resolve_config(Some(file.path()), None).unwrap();
        assert_eq!(config.connection.cmd_vel_topic, "/base/cmd_vel");

        let config = resolve_config(
            Some(file.path()),
            Some("connection.url = \"ws://robot:9090\"; publisher.period_ms = 20"),
        )
        .unwrap();
        assert_eq!(config.connection.cmd_vel_topic, "/base/cmd_vel");
        assert_eq!(config.connection.url, "ws://robot:9090");
        assert_eq!(config.publisher.period_ms, 20);

        // an override still has to produce a valid config
        assert!(resolve_config(None, Some("limits.max_angular = -1.0")).is_err());
        assert!(resolve_config(None, Some("limits.unknown = 1")).is_err());
    }
}
