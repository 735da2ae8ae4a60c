use anyhow::Context;
use clap::Parser;
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

mod client;
mod config;
mod game;
mod messages;
mod room;
mod room_coordinator;
mod tls;
#[cfg(test)]
mod test_utils;

use crate::config::{Cli, ServerConfig};
use crate::messages::CoordinatorMessage;
use crate::room_coordinator::{room_coordinator, spawn_sweeper};
use crate::tls::{load_acceptor, serve_tls_client};

/// Entry point: loads settings, then serves one task per connection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli)?;

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level()?)
        .init();

    let acceptor = load_acceptor(&config.cert_path, &config.key_path)?;

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Server listening on {} (TLS)", config.bind_addr);

    let (coordinator_tx, coordinator_rx) = mpsc::unbounded_channel::<CoordinatorMessage>();
    tokio::spawn(room_coordinator(coordinator_rx, config.max_players_per_room));
    spawn_sweeper(coordinator_tx.clone(), config.cleanup_interval());

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let keepalive = TcpKeepalive::new()
            .with_time(config.keepalive())
            .with_interval(Duration::from_secs(1));
        let sf = SockRef::from(&socket);
        let _ = sf.set_tcp_keepalive(&keepalive);

        tokio::spawn(serve_tls_client(
            acceptor.clone(),
            socket,
            addr,
            coordinator_tx.clone(),
        ));
    }
}
