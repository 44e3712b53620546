//! # hookshot
//!
//! Self-hostable webhook relay: tunnels public HTTP requests over a
//! persistent connection to a private relay client, which dispatches
//! them to a local HTTP target (`spec.md` §1-2).

mod cli;
mod display;
mod tui;

use clap::Parser;
use hookshot_config::Cli;
use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "hookshot=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli::dispatch(cli).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}
