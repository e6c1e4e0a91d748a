//! Spelling-bee profile tool.
//!
//! Inspects and edits the profile replica held in a local store, and runs
//! sync against a simulated paired device or a cloud container folder.
//!
//! Usage:
//!   spellbee --store profile.db create Ada --grade 2
//!   spellbee --store profile.db cloud-sync --dir ~/CloudContainer

use anyhow::Result;
use clap::Parser;
use spellbee_cli::{Args, run};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(&args, &mut std::io::stdout()).await
}
