//! Live protocol object traits
//!
//! The transport/session layer owns the authoritative connection, session
//! and consumer objects; this crate only reads them. These traits are the
//! narrow view the management adapters reconcile against.
//!
//! Every object carries a stable `u64` id assigned at construction and
//! never reused for a different object. Those ids are the reconciliation
//! keys: if an object vanishes and a successor appears under a new id, the
//! adapter tree sees a removal and an addition, never an update in place.
//! Counter methods are monotonic and maintained by the owning layer.

use std::sync::Arc;

use super::connection::Transport;

/// A live client connection, as owned by the transport layer
pub trait ConnectionModel: Send + Sync {
    /// Stable per-object id, the reconciliation key
    fn connection_id(&self) -> u64;

    /// Remote peer address rendered as a string
    fn remote_address(&self) -> String;

    fn client_id(&self) -> Option<String>;

    fn client_version(&self) -> Option<String>;

    /// Name of the virtual host the connection is bound to
    fn virtual_host_name(&self) -> String;

    fn transport(&self) -> Transport;

    fn port(&self) -> u16;

    fn bytes_in(&self) -> u64;
    fn bytes_out(&self) -> u64;
    fn messages_in(&self) -> u64;
    fn messages_out(&self) -> u64;

    /// Authoritative snapshot of the connection's live sessions
    fn session_models(&self) -> Vec<Arc<dyn SessionModel>>;

    /// Close the connection with an operator-visible reason
    fn close(&self, reason: &str);
}

/// A live session (channel) on a connection
pub trait SessionModel: Send + Sync {
    /// Stable per-object id, the reconciliation key
    fn session_id(&self) -> u64;

    /// Channel number, unique within the connection while the channel is
    /// open
    fn channel_id(&self) -> u32;

    fn is_producer_flow_blocked(&self) -> bool;

    fn transaction_begins(&self) -> u64;
    fn transaction_commits(&self) -> u64;

    /// Authoritative snapshot of the session's live consumers
    fn consumer_models(&self) -> Vec<Arc<dyn ConsumerModel>>;
}

/// A live consumer on a session
pub trait ConsumerModel: Send + Sync {
    /// Stable per-object id, the reconciliation key
    fn consumer_id(&self) -> u64;

    fn name(&self) -> String;

    /// Queue the consumer is attached to
    fn queue_name(&self) -> String;

    /// Whether the consumer acquires (moves) messages rather than copying
    /// them
    fn acquires(&self) -> bool;

    fn bytes_out(&self) -> u64;
    fn messages_out(&self) -> u64;
    fn unacknowledged_bytes(&self) -> u64;
    fn unacknowledged_messages(&self) -> u64;
}

/// Supplies the broker-level set of live connections
pub trait ConnectionSource: Send + Sync {
    fn connection_models(&self) -> Vec<Arc<dyn ConnectionModel>>;
}
