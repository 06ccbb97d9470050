//! `pas-node`: the BESS-PAS traceability service.

use anyhow::Result;
use tracing::{error, info};

use node_runtime::{logging, NodeConfig, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env()?;
    logging::init(&config.logging)?;

    let runtime = match NodeRuntime::new(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return Err(e);
        }
    };

    info!("Node is running. Press Ctrl+C to stop.");
    runtime
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await
}
