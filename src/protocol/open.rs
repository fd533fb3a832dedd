//! Connection-open handshake
//!
//! Drives the single protocol transition this core owns:
//!
//! ```text
//! Client                                       Broker
//!   |                                            |
//!   |------ open(virtual-host, client-id) ------>|
//!   |                                            | resolve vhost
//!   |                                            | bind vhost, assign id
//!   |<----- open-ok(version, known-hosts) -------|
//!   |                                            |
//!   |            [Connection OPEN]               |
//! ```
//!
//! A miss on the virtual-host directory is the only expected failure; it is
//! connection-fatal, never retried, and leaves the connection in
//! `AwaitingOpen` for the caller to close.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::HandshakeError;
use crate::vhost::VirtualHostDirectory;

use super::connection::{ProtocolConnection, ProtocolVersion};

/// Payload of the open acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOk {
    /// Negotiated protocol version
    pub version: ProtocolVersion,
    /// The virtual-host field exactly as the client sent it
    pub known_hosts: Option<String>,
}

/// Coordinates the connection-open transition against the broker's
/// virtual-host directory
pub struct HandshakeCoordinator {
    directory: Arc<VirtualHostDirectory>,
}

impl HandshakeCoordinator {
    pub fn new(directory: Arc<VirtualHostDirectory>) -> Self {
        Self { directory }
    }

    /// Handle a connection-open request
    ///
    /// A leading path separator on the requested name is stripped (clients
    /// send it per protocol convention); an absent name resolves through
    /// the directory's default host and stays distinct from an explicit
    /// empty string. On success the virtual host is bound to the
    /// connection, a client id is synthesized if the client supplied none,
    /// and the connection advances to OPEN.
    pub async fn handle_open(
        &self,
        connection: &mut ProtocolConnection,
        requested_virtual_host: Option<&str>,
    ) -> Result<OpenOk, HandshakeError> {
        let normalized =
            requested_virtual_host.map(|name| name.strip_prefix('/').unwrap_or(name));

        let host = self
            .directory
            .resolve(normalized)
            .await
            .ok_or_else(|| match normalized {
                Some(name) => HandshakeError::UnknownVirtualHost(name.to_string()),
                None => HandshakeError::NoDefaultVirtualHost,
            })?;

        connection.bind_virtual_host(Arc::clone(&host));

        // AMQP 0-8/0-9 section 3.1.2: the broker names otherwise anonymous
        // clients, but never renames one that identified itself.
        if connection.client_id().is_none() {
            connection.set_client_id(generate_client_id());
        }

        let response = OpenOk {
            version: connection.version(),
            known_hosts: requested_virtual_host.map(str::to_string),
        };

        connection.open();

        tracing::info!(
            connection = %connection.id(),
            vhost = %host.name(),
            peer = %connection.peer_addr(),
            "Connection open"
        );

        Ok(response)
    }
}

/// Synthesize a client identifier from the wall clock at negotiation time
fn generate_client_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}
