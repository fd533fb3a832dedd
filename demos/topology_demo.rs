//! Broker topology walkthrough
//!
//! Builds a virtual-host directory, bootstraps the standard exchanges,
//! runs a connection-open handshake and exercises the exchange registry.
//!
//! Run with: cargo run --example topology_demo

use std::net::SocketAddr;
use std::sync::Arc;

use broker_rs::exchange::{
    AuthorizationService, DurableStore, Exchange, StandardExchangeFactory, StoreError,
};
use broker_rs::protocol::Transport;
use broker_rs::{
    BrokerConfig, HandshakeCoordinator, ProtocolConnection, VirtualHostDirectory,
};

struct AllowAll;

impl AuthorizationService for AllowAll {
    fn authorize_delete(&self, _exchange: &Exchange) -> bool {
        true
    }
}

struct LoggingStore;

impl DurableStore for LoggingStore {
    fn persist_exchange_create(&self, exchange: &Exchange) -> Result<(), StoreError> {
        tracing::info!(exchange = %exchange.name(), "Persisted durable exchange");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = BrokerConfig::empty()
        .virtual_host("reports")
        .default_virtual_host("reports");
    let directory =
        Arc::new(VirtualHostDirectory::from_config(&config, Arc::new(AllowAll)).await);

    let factory = StandardExchangeFactory::new();
    for host in directory.hosts().await {
        host.initialise(&factory, &LoggingStore).await?;
    }

    // Client opens a connection against the default virtual host
    let coordinator = HandshakeCoordinator::new(Arc::clone(&directory));
    let peer: SocketAddr = "127.0.0.1:51234".parse()?;
    let mut connection = ProtocolConnection::new(peer, Transport::Tcp, 5672);
    let open_ok = coordinator.handle_open(&mut connection, Some("/reports")).await?;
    tracing::info!(
        version = %open_ok.version,
        client_id = connection.client_id().unwrap_or("-"),
        "Handshake complete"
    );

    // Walk the topology the handshake bound
    let host = connection.virtual_host().expect("bound by handshake");
    for exchange in host.exchanges().await {
        tracing::info!(
            exchange = %exchange.name(),
            kind = %exchange.kind(),
            durable = exchange.is_durable(),
            "Exchange"
        );
    }

    // Deleting twice: the second attempt is a benign no-op
    let removed = host.unregister_exchange("amq.fanout", false).await?;
    let removed_again = host.unregister_exchange("amq.fanout", false).await?;
    tracing::info!(removed, removed_again, "Unregister amq.fanout twice");

    Ok(())
}
