use clap::Parser;
use tracing::{error, info, warn};

use fronius_mcp::client::FroniusClient;
use fronius_mcp::config::Cli;
use fronius_mcp::mcp::McpServer;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for the protocol.
    let log_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.as_filter().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|panic| {
        error!("fatal: {panic}");
        std::process::exit(1);
    }));

    let config = match cli.resolve() {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = match FroniusClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to create HTTP client: {e}");
            std::process::exit(1);
        }
    };

    if cli.test_connection {
        info!("testing connection to {}", client.base_url());
        if client.test_connection().await {
            println!("Connection to {} successful", client.base_url());
            std::process::exit(0);
        }
        println!("Connection to {} failed", client.base_url());
        std::process::exit(1);
    }

    info!(
        "fronius-mcp v{} starting, device at {}",
        env!("CARGO_PKG_VERSION"),
        client.base_url()
    );
    match client.api_version().await {
        Ok(version) => info!(api_version = ?version.version(), "device reachable"),
        Err(e) => {
            warn!("device not reachable at startup: {e}");
            warn!("continuing; requests will be retried when they arrive");
        }
    }

    let server = McpServer::new(client);

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("Received SIGINT"),
                        _ = sigterm.recv() => info!("Received SIGTERM"),
                    }
                }
                Err(e) => {
                    warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                    info!("Received SIGINT");
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("Received SIGINT");
        }
    };

    tokio::select! {
        () = server.run_stdio() => info!("stdin closed, shutting down"),
        () = shutdown => info!("Shutting down..."),
    }
}
