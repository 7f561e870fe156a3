use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use wire_transfer::server::{DEFAULT_CAPACITY, Server};

#[derive(Parser)]
#[command(name = "wire-server")]
#[command(about = "Serve a directory of resources over the wire protocol", long_about = None)]
struct Args {
    /// The IP address to listen on
    host: String,

    /// The port number to listen on
    port: u16,

    /// Directory served as the resource root
    #[arg(long, default_value = "server")]
    root: PathBuf,

    /// Maximum number of concurrently active connections
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = Server::builder()
        .address((args.host.as_str(), args.port))
        .root(args.root)
        .capacity(args.capacity)
        .build()?;

    server.run().await?;
    Ok(())
}
