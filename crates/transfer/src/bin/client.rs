use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use wire_transfer::client::{RequestDriver, parse_script};

#[derive(Parser)]
#[command(name = "wire-client")]
#[command(about = "Run an ordered command script against wire servers", long_about = None)]
struct Args {
    /// Path to the command script, one command per line:
    /// `get|post <resource> <host> [port]`
    script: PathBuf,

    /// Directory used as the local resource root
    #[arg(long, default_value = "client")]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let text = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("reading command script {}", args.script.display()))?;

    let commands = parse_script(&text);
    if commands.is_empty() {
        info!(script = %args.script.display(), "no commands to run");
        return Ok(());
    }

    let driver = RequestDriver::new(args.root);
    driver.run(&commands).await.context("command sequence aborted")?;

    info!(count = commands.len(), "all commands finished");
    Ok(())
}
