//! Main entry point for the zipserve HTTP server.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;

use zipserve::{Cli, Unzipper, http};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let config = cli.config()?;
    info!(
        "Serving *.{} archives under {}",
        config.extension,
        config.root.display()
    );

    let routes = http::routes(Arc::new(Unzipper::new(config)));
    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(cli.bind, async {
        let _ = tokio::signal::ctrl_c().await;
    })?;

    info!("Listening on http://{}/{}/", addr, http::MOUNT);
    server.await;
    info!("Shut down");

    Ok(())
}
