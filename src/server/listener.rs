use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::resource::ServerContext;

pub async fn run(cfg: &ServerConfig, context: Arc<ServerContext>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;
    info!(
        address = %cfg.listen_addr,
        max_connections = cfg.max_connections,
        root = %context.root().display(),
        correlated = context.correlated().len(),
        "Listening"
    );

    serve(listener, cfg.max_connections, context).await
}

/// Accepts connections forever, running at most `max_connections` at once.
pub async fn serve(
    listener: TcpListener,
    max_connections: usize,
    context: Arc<ServerContext>,
) -> anyhow::Result<()> {
    let limit = Arc::new(Semaphore::new(max_connections));

    loop {
        // Wait for a free slot before accepting.
        let permit = limit.clone().acquire_owned().await?;
        let (socket, peer) = listener.accept().await.context("Failed to accept connection")?;
        info!(%peer, "Accepted connection");

        let context = context.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, context);
            if let Err(e) = conn.run().await {
                tracing::error!(%peer, "Connection error: {:#}", e);
            }
            tracing::debug!(%peer, "Connection closed");
            drop(permit);
        });
    }
}
