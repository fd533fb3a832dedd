//! Connection-open state machine
//!
//! Tracks a client connection from transport accept to the OPEN state.
//! Channel-level transitions after OPEN belong to the frame layer, not
//! here.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::ids;
use crate::vhost::VirtualHost;

/// Negotiated protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    /// AMQP 0-9-1
    pub const AMQP_0_9: ProtocolVersion = ProtocolVersion { major: 0, minor: 9 };
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.major, self.minor)
    }
}

/// Transport the connection arrived over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Tls,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => f.write_str("TCP"),
            Transport::Tls => f.write_str("TLS"),
        }
    }
}

/// Connection lifecycle phase driven by this core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Protocol negotiated, waiting for the open request
    AwaitingOpen,
    /// Open accepted, connection usable
    Open,
}

/// Per-connection protocol state
#[derive(Debug)]
pub struct ProtocolConnection {
    /// Process-assigned id, distinct from any protocol-level session id
    id: Uuid,

    /// Remote peer address
    peer_addr: SocketAddr,

    transport: Transport,

    /// Local port the client connected to
    port: u16,

    version: ProtocolVersion,

    phase: ConnectionPhase,

    /// Client-declared identifier, if any
    client_id: Option<String>,

    /// Client library version string, if announced
    client_version: Option<String>,

    /// Virtual host bound by the open handshake
    virtual_host: Option<Arc<VirtualHost>>,

    connected_at: Instant,
}

impl ProtocolConnection {
    /// Create a connection in the `AwaitingOpen` phase
    pub fn new(peer_addr: SocketAddr, transport: Transport, port: u16) -> Self {
        Self {
            id: ids::random_uuid(),
            peer_addr,
            transport,
            port,
            version: ProtocolVersion::AMQP_0_9,
            phase: ConnectionPhase::AwaitingOpen,
            client_id: None,
            client_version: None,
            virtual_host: None,
            connected_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Record the client identifier
    ///
    /// The handshake only calls this when the client has not already
    /// established one.
    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = Some(client_id.into());
    }

    pub fn client_version(&self) -> Option<&str> {
        self.client_version.as_deref()
    }

    pub fn set_client_version(&mut self, version: impl Into<String>) {
        self.client_version = Some(version.into());
    }

    /// Virtual host bound by the open handshake, if any
    pub fn virtual_host(&self) -> Option<&Arc<VirtualHost>> {
        self.virtual_host.as_ref()
    }

    /// Bind the resolved virtual host; observable by later session creation
    pub fn bind_virtual_host(&mut self, host: Arc<VirtualHost>) {
        self.virtual_host = Some(host);
    }

    /// Advance to OPEN
    pub fn open(&mut self) {
        self.phase = ConnectionPhase::Open;
    }

    /// How long the connection has been up
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 51234)
    }

    #[test]
    fn test_new_connection_awaits_open() {
        let conn = ProtocolConnection::new(peer(), Transport::Tcp, 5672);
        assert_eq!(conn.phase(), ConnectionPhase::AwaitingOpen);
        assert!(!conn.is_open());
        assert!(conn.client_id().is_none());
        assert!(conn.virtual_host().is_none());
    }

    #[test]
    fn test_connection_ids_are_distinct() {
        let a = ProtocolConnection::new(peer(), Transport::Tcp, 5672);
        let b = ProtocolConnection::new(peer(), Transport::Tcp, 5672);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(ProtocolVersion::AMQP_0_9.to_string(), "0-9");
        assert_eq!(Transport::Tls.to_string(), "TLS");
    }
}
