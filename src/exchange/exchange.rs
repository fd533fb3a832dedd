//! Exchange entity
//!
//! An exchange is a named routing entity messages are published to. Routing
//! and binding logic live elsewhere; this type carries identity and the
//! attributes the registry and management layers need.

use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::ids;
use crate::model::Identifiable;

use super::types::{ExchangeAttributes, ExchangeKind};

/// Canonical name of the per-virtual-host default exchange.
///
/// Clients address the default exchange with an empty name on the wire; this
/// is the name it reports through management interfaces.
pub const DEFAULT_EXCHANGE_NAME: &str = "<<default>>";

/// Weak reference to an alternate exchange, by name and id.
///
/// Never ownership: the alternate may be deleted independently and lookups
/// through the registry decide what that means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateExchange {
    pub id: Uuid,
    pub name: String,
}

/// A single exchange within a virtual host
#[derive(Debug)]
pub struct Exchange {
    id: Uuid,
    name: String,
    kind: ExchangeKind,
    durable: bool,
    alternate: Option<AlternateExchange>,
    closed: AtomicBool,
}

impl Exchange {
    /// Create an exchange from its declared attributes
    ///
    /// The name must be non-empty; the empty name is reserved for
    /// addressing the default-exchange sentinel and would make a registered
    /// exchange unreachable by lookup.
    pub fn new(attrs: ExchangeAttributes) -> Self {
        debug_assert!(!attrs.name.is_empty(), "exchange name must not be empty");
        Self {
            id: attrs.id,
            name: attrs.name,
            kind: attrs.kind,
            durable: attrs.durable,
            alternate: attrs.alternate,
            closed: AtomicBool::new(false),
        }
    }

    /// Create the default-exchange sentinel for a virtual host
    ///
    /// Its id is derived from the canonical name and the virtual host name,
    /// so it is stable across restarts without being persisted.
    pub fn default_exchange(vhost_name: &str) -> Self {
        Self::new(ExchangeAttributes {
            id: ids::exchange_uuid(DEFAULT_EXCHANGE_NAME, vhost_name),
            name: DEFAULT_EXCHANGE_NAME.to_string(),
            kind: ExchangeKind::Direct,
            durable: false,
            alternate: None,
        })
    }

    /// Exchange name (unique within its virtual host)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &ExchangeKind {
        &self.kind
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn alternate(&self) -> Option<&AlternateExchange> {
        self.alternate.as_ref()
    }

    /// Whether this is the default-exchange sentinel
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_EXCHANGE_NAME
    }

    /// Release the exchange's resources on removal.
    ///
    /// Idempotent; the registry calls this exactly once per removed entry,
    /// but a close racing a registry teardown is harmless.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(exchange = %self.name, "Exchange closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Identifiable for Exchange {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
