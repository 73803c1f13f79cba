#![cfg_attr(windows, allow(dead_code, unused_imports))]

use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
#[cfg(unix)]
use teleop_apps::keyboard::{KeyAction, KeyboardInput, USAGE};
use teleop_apps::{
    utils::{get_config_path, init_tracing, resolve_config},
    LoggingMoveBase,
};
use teleop_core::{InputEvent, MoveBase, TeleopHandle, VelocityPublisher};
use teleop_rosbridge::{RosbridgeClient, RosbridgeCmdVelMoveBase};
use tracing::{error, info, warn};

/// Drive a robot through rosbridge from the terminal.
#[derive(Parser, Debug)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    /// Path to the setting file.
    #[clap(short, long, value_parser)]
    config_path: Option<PathBuf>,
    /// Set options from command line. These settings take priority over the
    /// setting file specified by --config-path.
    #[clap(long)]
    config: Option<String>,
    /// Do not connect; log the commands that would be sent.
    #[clap(long)]
    dry_run: bool,
}

#[cfg(windows)]
fn main() {
    println!("{} is not supported on windows", env!("CARGO_BIN_NAME"));
}

#[cfg(unix)]
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config_path = get_config_path(args.config_path);
    let config = resolve_config(config_path.as_deref(), args.config.as_deref())?;
    let handle = TeleopHandle::new(config.limits);
    let publisher_config = config.publisher_config()?;

    if args.dry_run {
        info!("dry run: commands are not sent");
        let publisher = Arc::new(VelocityPublisher::new(
            LoggingMoveBase::new(),
            handle,
            publisher_config,
        ));
        drive(&publisher, std::future::pending()).await?;
        let count = publisher.move_base().recorded().sent_count();
        info!(count, "velocities recorded");
        return Ok(());
    }

    let settings = config.connection_settings()?;
    let client = RosbridgeClient::connect(&settings.url, settings.connect_timeout).await?;
    let move_base = RosbridgeCmdVelMoveBase::new(&client, &settings.cmd_vel_topic)?;
    info!(url = %settings.url, topic = %move_base.topic(), "connected");
    let publisher = Arc::new(VelocityPublisher::new(move_base, handle, publisher_config));

    let mut state = client.state_receiver();
    let closed = async move {
        if let Ok(state) = state.wait_for(|state| !state.is_connected()).await {
            warn!(state = %*state, "rosbridge session ended");
        }
    };
    let result = drive(&publisher, closed).await;
    drop(publisher);
    client.close();
    result
}

/// Feeds key presses into the publisher until the operator quits or
/// `closed` completes.
#[cfg(unix)]
async fn drive<M>(
    publisher: &Arc<VelocityPublisher<M>>,
    closed: impl Future<Output = ()>,
) -> Result<()>
where
    M: MoveBase + Send + Sync + 'static,
{
    let keyboard = KeyboardInput::new()?;
    println!("{USAGE}");
    let handle = publisher.handle().clone();
    let task = publisher.spawn();

    tokio::pin!(closed);
    loop {
        let action = tokio::select! {
            action = keyboard.next_action() => action,
            () = &mut closed => None,
        };
        let Some(action) = action else {
            break;
        };
        match action {
            KeyAction::Quit => break,
            KeyAction::Input(InputEvent::ToggleEmergencyStop) if !handle.is_emergency_stopped() => {
                if let Err(e) = publisher.emergency_stop_now() {
                    error!("{e}");
                }
            }
            KeyAction::Input(event) => handle.apply(event),
            KeyAction::ScaleLimits(factor) => match handle.limits().scaled(factor) {
                Ok(limits) => {
                    if let Err(e) = handle.set_limits(limits) {
                        error!("{e}");
                    }
                    info!(
                        max_linear = limits.max_linear,
                        max_angular = limits.max_angular,
                        "limits"
                    );
                }
                Err(e) => error!("{e}"),
            },
        }
        let command = handle.command();
        info!(
            linear = command.x,
            angular = command.theta,
            estop = handle.is_emergency_stopped(),
            "command"
        );
    }

    publisher.stop();
    task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let bin = env!("CARGO_BIN_NAME");
        let args = Args::try_parse_from([bin]).unwrap();
        assert!(!args.dry_run);
        let args = Args::try_parse_from([bin, "--dry-run", "--config-path", "path"]).unwrap();
        assert!(args.dry_run);
        assert_eq!(args.config_path, Some(PathBuf::from("path")));
        assert!(Args::try_parse_from([bin, "--config"]).is_err());
    }
}
