//! This file defines the radiant binary entry point.

use radiant::app;
use radiant::cli;
use radiant::server;
use radiant::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    ::tracing::info!("{:?}", args);
    let service = app::service(&args);
    server::serve(&args, service).await;
}
