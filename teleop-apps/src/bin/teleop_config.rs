use anyhow::Result;
use clap::{Parser, Subcommand};
use schemars::schema_for;
use teleop_apps::{utils::init_tracing, TeleopConfig};
use tracing::debug;

#[derive(Debug, Parser)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    #[clap(subcommand)]
    subcommand: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate JSON schema for the config file.
    Schema,
    /// Print the default config as TOML.
    Default,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    debug!(?args);

    match args.subcommand {
        Command::Schema => {
            let schema = schema_for!(TeleopConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Default => {
            print!("{}", toml::to_string(&TeleopConfig::default())?);
        }
    }
    Ok(())
}
