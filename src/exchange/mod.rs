//! Exchange registry for virtual-host topology
//!
//! The registry manages the named exchanges of one virtual host and notifies
//! listeners (durable store, statistics, management protocols) as exchanges
//! come and go.
//!
//! # Architecture
//!
//! ```text
//!                          ExchangeRegistry
//!                     ┌──────────────────────────┐
//!                     │ exchanges: RwLock<       │
//!                     │   HashMap<name,          │
//!                     │     Arc<Exchange>>>      │
//!                     │ default_exchange (never  │
//!                     │   in the map)            │
//!                     │ listeners: Mutex<Vec<_>> │
//!                     └───────────┬──────────────┘
//!                                 │ ordered dispatch
//!             ┌───────────────────┼───────────────────┐
//!             ▼                   ▼                   ▼
//!       [DurableStore]     [Statistics]       [Management]
//! ```
//!
//! # Concurrency
//!
//! The name map is read-mostly and guarded by a `RwLock` held only for the
//! map operation itself. Listener dispatch happens under a separate lock so
//! listeners observe register/unregister callbacks in a strict order without
//! serializing lookups. Collaborator calls (authorization, durable store)
//! are made outside the map lock.

pub mod error;
#[allow(clippy::module_inception)]
pub mod exchange;
pub mod registry;
pub mod types;

pub use error::{RegistryError, StoreError};
pub use exchange::{AlternateExchange, Exchange, DEFAULT_EXCHANGE_NAME};
pub use registry::{AuthorizationService, DurableStore, ExchangeRegistry, RegistryChangeListener};
pub use types::{
    ExchangeAttributes, ExchangeFactory, ExchangeKind, ExchangeTypeDescriptor, FactoryError,
    StandardExchangeFactory,
};
