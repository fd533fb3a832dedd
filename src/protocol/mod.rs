//! Protocol-facing surface of the broker core
//!
//! [`connection`] holds the per-connection open state machine, [`open`]
//! drives the connection-open handshake against the virtual-host directory,
//! and [`model`] defines the traits through which the transport/session
//! layer exposes its live connections, sessions and consumers to the
//! management model.

pub mod connection;
pub mod model;
pub mod open;

pub use connection::{ConnectionPhase, ProtocolConnection, ProtocolVersion, Transport};
pub use model::{ConnectionModel, ConnectionSource, ConsumerModel, SessionModel};
pub use open::{HandshakeCoordinator, OpenOk};
