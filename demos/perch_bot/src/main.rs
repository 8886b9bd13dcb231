//! Perch demo bot
//!
//! Wires a handful of small plugins onto a single IRC connection:
//!
//! - `dice`: rolls `NdM` dice written anywhere in a message
//! - `karma`: tracks `name++` / `name--` and answers `!karma <nick>`
//! - `echo`: a private-only `echo` command
//!
//! # Usage
//!
//! ```bash
//! cargo run --package perch-bot -- --config demos/perch_bot/perch.toml
//! ```

mod plugins;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use perch::runtime::PerchRuntime;
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "A small demonstration bot built on Perch")]
struct Args {
    /// Configuration file to load instead of searching the default locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production` (also read from PERCH_PROFILE).
    #[arg(short, long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = PerchRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }

    let runtime = builder.build()?;
    plugins::register_all(runtime.registry())?;
    info!(plugins = ?runtime.registry().names(), "Demo plugins registered");

    runtime.run().await?;
    Ok(())
}
