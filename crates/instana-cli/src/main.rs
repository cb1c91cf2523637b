//! cli entrypoint for the instana provider.

mod app;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// main entrypoint for the async cli.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = app::Cli::parse();
    app::run(cli).await
}
