//! AMQP broker runtime core
//!
//! This crate is the live-topology core of an AMQP message broker: it tracks
//! exchanges, connections, sessions and consumers as clients connect,
//! negotiate the connection-open handshake, and create or destroy protocol
//! entities, while exposing a consistent, concurrently-readable management
//! view of that topology.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<VirtualHostDirectory>
//!                  ┌───────────────────────────────┐
//!                  │ hosts: name -> VirtualHost    │
//!                  │   └─ ExchangeRegistry         │
//!                  │        exchanges, listeners   │
//!                  └─────────────┬─────────────────┘
//!                                │ resolve
//!                                ▼
//!      [HandshakeCoordinator] ── open ──► ProtocolConnection {Open}
//!                                               │
//!                                               ▼ session/consumer models
//!                  [ManagementTree] ── reconcile ──► adapter tree
//!                    ConnectionAdapter ─► SessionAdapter ─► ConsumerAdapter
//! ```
//!
//! Wire-level framing, transport I/O, management front-ends and durable
//! storage engines are external collaborators consumed through the narrow
//! traits in [`exchange`] and [`protocol::model`].

pub mod config;
pub mod error;
pub mod exchange;
pub mod ids;
pub mod model;
pub mod protocol;
pub mod vhost;

pub use config::BrokerConfig;
pub use error::{Error, HandshakeError, Result};
pub use exchange::{Exchange, ExchangeKind, ExchangeRegistry, RegistryError};
pub use model::{ConnectionAdapter, ConsumerAdapter, ManagementTree, SessionAdapter};
pub use protocol::{ConnectionPhase, HandshakeCoordinator, OpenOk, ProtocolConnection};
pub use vhost::{VirtualHost, VirtualHostDirectory};
