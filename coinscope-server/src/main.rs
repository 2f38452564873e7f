//! coinscope server - MCP gateway daemon

use std::sync::Arc;

use tracing::{error, info};

use coinscope_server::cli::Args;
use coinscope_server::config::ConfigLoader;
use coinscope_server::mcp::Dispatcher;
use coinscope_server::transport::{serve_stdio, SseServer};
use coinscope_utils::{init_logging_with_config, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    let mut config = ConfigLoader::load(args.config.as_deref())?;
    args.apply(&mut config);

    init_logging_with_config(config.logging.log_config())?;

    if let Err(e) = ConfigLoader::validate(&config) {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    let tools: Vec<&str> = config.enabled_tools().iter().map(|t| t.name()).collect();
    info!(
        profile = %config.server.profile,
        ?tools,
        "coinscope {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);

    if args.stdio {
        serve_stdio(dispatcher).await?;
    } else {
        let listener = SseServer::bind(&config.server.listen_addr()).await?;
        SseServer::new(dispatcher, config.server.keepalive())
            .serve(listener, shutdown_signal())
            .await?;
    }

    info!("coinscope stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
