use std::time::Duration;

use assert_approx_eq::assert_approx_eq;
use teleop_apps::TeleopConfig;

#[test]
fn verify_sample_configs() {
    let files = vec![
        "config/sample_teleop_config.toml",
        "config/secure_teleop_config.toml",
        "config/turtlebot3_teleop_config.toml",
    ];

    for f in files {
        let result = TeleopConfig::new(f);
        assert!(result.is_ok(), "{:?} {:?}", f, result);
        let panel = result.unwrap().panel_config();
        assert!(panel.is_ok(), "{:?} {:?}", f, panel);
    }
}

#[test]
fn sample_config_is_default() {
    let config = TeleopConfig::new("config/sample_teleop_config.toml").unwrap();
    assert_eq!(config, TeleopConfig::default());
}

#[test]
fn turtlebot3_config() {
    let config = TeleopConfig::new("config/turtlebot3_teleop_config.toml").unwrap();
    assert_approx_eq!(config.limits.max_linear, 0.22);
    assert_approx_eq!(config.limits.max_angular, 2.84);
    assert_eq!(config.connection.cmd_vel_topic, "/cmd_vel");
    let publisher = config.publisher_config().unwrap();
    assert!(!publisher.publish_when_idle);
    assert_eq!(publisher.period, Duration::from_millis(50));
}

#[test]
fn secure_config() {
    let config = TeleopConfig::new("config/secure_teleop_config.toml").unwrap();
    let settings = config.connection_settings().unwrap();
    assert_eq!(settings.url, "wss://robot.example.com/rosbridge");
    assert_eq!(settings.cmd_vel_topic, "/base_controller/cmd_vel");
    assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    assert_eq!(
        config.publisher_config().unwrap().period,
        Duration::from_millis(100)
    );
}
