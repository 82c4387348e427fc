//! Alert Router - Main Entry Point

use api::{init_logging, load_config, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Alert Router v{} ===", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    run_server(config).await?;

    Ok(())
}
