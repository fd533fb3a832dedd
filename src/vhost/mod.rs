//! Virtual hosts and the broker's virtual-host directory
//!
//! A virtual host is an isolated namespace with its own exchange topology.
//! [`VirtualHost`] is a thin composition root around one
//! [`ExchangeRegistry`]; [`VirtualHostDirectory`] is the broker-wide name
//! lookup the connection-open handshake resolves against.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::exchange::{
    AuthorizationService, DurableStore, Exchange, ExchangeFactory, ExchangeRegistry,
    RegistryChangeListener, RegistryError,
};

/// One virtual host's topology
pub struct VirtualHost {
    name: String,
    registry: ExchangeRegistry,
}

impl std::fmt::Debug for VirtualHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualHost")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl VirtualHost {
    /// Create a virtual host with an empty exchange registry
    pub fn new(name: impl Into<String>, authorizer: Arc<dyn AuthorizationService>) -> Self {
        let name = name.into();
        let registry = ExchangeRegistry::new(name.clone(), authorizer);
        Self { name, registry }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The exchange registry scoped to this virtual host
    pub fn exchange_registry(&self) -> &ExchangeRegistry {
        &self.registry
    }

    /// Bootstrap the standard exchanges for every known type
    pub async fn initialise(
        &self,
        factory: &dyn ExchangeFactory,
        store: &dyn DurableStore,
    ) -> Result<(), RegistryError> {
        self.registry.initialise(factory, store).await
    }

    pub async fn register_exchange(&self, exchange: Arc<Exchange>) {
        self.registry.register(exchange).await;
    }

    pub async fn unregister_exchange(
        &self,
        name: &str,
        in_use: bool,
    ) -> Result<bool, RegistryError> {
        self.registry.unregister(name, in_use).await
    }

    pub async fn exchange(&self, name: Option<&str>) -> Option<Arc<Exchange>> {
        self.registry.exchange(name).await
    }

    pub async fn exchange_by_id(&self, id: Option<Uuid>) -> Option<Arc<Exchange>> {
        self.registry.exchange_by_id(id).await
    }

    pub fn default_exchange(&self) -> Arc<Exchange> {
        self.registry.default_exchange()
    }

    pub async fn is_reserved_exchange_name(&self, name: Option<&str>) -> bool {
        self.registry.is_reserved_name(name).await
    }

    pub async fn exchanges(&self) -> Vec<Arc<Exchange>> {
        self.registry.exchanges().await
    }

    pub async fn add_registry_listener(&self, listener: Box<dyn RegistryChangeListener>) {
        self.registry.add_listener(listener).await;
    }
}

/// Broker-wide directory of virtual hosts
///
/// Resolution with no name yields the configured default host, when one is
/// set; that is distinct from resolving an explicit (possibly empty) name,
/// which must match exactly.
pub struct VirtualHostDirectory {
    hosts: RwLock<HashMap<String, Arc<VirtualHost>>>,
    default_host: RwLock<Option<String>>,
}

impl VirtualHostDirectory {
    pub fn new() -> Self {
        Self {
            hosts: RwLock::new(HashMap::new()),
            default_host: RwLock::new(None),
        }
    }

    /// Build a directory from configuration
    ///
    /// Registries start empty; callers run `initialise` per host with their
    /// factory and store collaborators.
    pub async fn from_config(
        config: &BrokerConfig,
        authorizer: Arc<dyn AuthorizationService>,
    ) -> Self {
        let directory = Self::new();
        for name in &config.virtual_hosts {
            directory
                .register(Arc::new(VirtualHost::new(
                    name.clone(),
                    Arc::clone(&authorizer),
                )))
                .await;
        }
        if let Some(default) = &config.default_virtual_host {
            directory.set_default(default.clone()).await;
        }
        directory
    }

    /// Register a virtual host under its name
    pub async fn register(&self, host: Arc<VirtualHost>) {
        let name = host.name().to_string();
        self.hosts.write().await.insert(name.clone(), host);
        tracing::info!(vhost = %name, "Virtual host registered");
    }

    /// Set the host resolved when a client names none
    pub async fn set_default(&self, name: impl Into<String>) {
        *self.default_host.write().await = Some(name.into());
    }

    /// Resolve a virtual host
    ///
    /// `None` means "no virtual host specified" and resolves through the
    /// configured default; `Some(name)` is an exact lookup.
    pub async fn resolve(&self, name: Option<&str>) -> Option<Arc<VirtualHost>> {
        let hosts = self.hosts.read().await;
        match name {
            Some(name) => hosts.get(name).cloned(),
            None => {
                let default = self.default_host.read().await;
                default.as_deref().and_then(|name| hosts.get(name).cloned())
            }
        }
    }

    /// Snapshot of the registered virtual hosts
    pub async fn hosts(&self) -> Vec<Arc<VirtualHost>> {
        self.hosts.read().await.values().cloned().collect()
    }
}

impl Default for VirtualHostDirectory {
    fn default() -> Self {
        Self::new()
    }
}
