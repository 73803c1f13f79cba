use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use teleop_apps::utils::{get_config_path, init_tracing, resolve_config};
use tracing::info;

/// Control panel for driving a robot through rosbridge.
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
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config_path = get_config_path(args.config_path);
    let config = resolve_config(config_path.as_deref(), args.config.as_deref())?;
    let panel_config = config.panel_config()?;
    info!(url = %panel_config.connection.url, "starting teleop panel");

    // The GUI owns the main thread; network I/O runs on this runtime.
    let runtime = tokio::runtime::Runtime::new()?;
    teleop_gui::teleop_panel(panel_config, runtime.handle().clone())?;
    Ok(())
}
