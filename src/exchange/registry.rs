//! Exchange registry implementation
//!
//! The per-virtual-host registry that maps exchange names to exchanges,
//! serves the default-exchange fallback, and notifies listeners of
//! registration changes in a strict order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::ids;

use super::error::{RegistryError, StoreError};
use super::exchange::{Exchange, DEFAULT_EXCHANGE_NAME};
use super::types::{
    ExchangeAttributes, ExchangeFactory, ExchangeTypeDescriptor, FactoryError,
};

/// Name prefixes reserved for broker-managed exchanges
const RESERVED_PREFIXES: [&str; 2] = ["amq.", "qpid."];

/// Listener notified of exchange registration changes
///
/// Callbacks are dispatched synchronously, in listener-registration order,
/// under a single dispatch lock: a listener never observes interleaved
/// callbacks from two different mutating calls. Keep callbacks cheap.
pub trait RegistryChangeListener: Send {
    fn exchange_registered(&self, exchange: &Arc<Exchange>);
    fn exchange_unregistered(&self, exchange: &Arc<Exchange>);
}

/// Authorization collaborator consulted before any exchange removal
pub trait AuthorizationService: Send + Sync {
    /// Whether deletion of the given exchange is permitted
    fn authorize_delete(&self, exchange: &Exchange) -> bool;
}

/// Durable-store collaborator
///
/// Invoked only when a newly created exchange is durable. Failures during
/// bootstrap are fatal; on declare paths they surface to the declaring
/// caller.
pub trait DurableStore: Send + Sync {
    fn persist_exchange_create(&self, exchange: &Exchange) -> Result<(), StoreError>;
}

/// Central registry for one virtual host's exchanges
///
/// The name map is guarded by a `RwLock` held only for the map operation
/// itself, so lookups stay concurrent with registration. The default
/// exchange is a sentinel held outside the map: it resolves for the empty
/// or absent name but never appears in enumeration, so it is never
/// reported as removable.
pub struct ExchangeRegistry {
    /// Virtual host this registry is scoped to
    vhost_name: String,

    /// Map of exchange name to exchange
    exchanges: RwLock<HashMap<String, Arc<Exchange>>>,

    /// Sentinel resolved for empty/absent names, never in the map
    default_exchange: Arc<Exchange>,

    /// Exchange types seen at bootstrap, for reserved-name checks
    registered_types: RwLock<Vec<ExchangeTypeDescriptor>>,

    /// Ordered listener list with its own dispatch lock
    listeners: Mutex<Vec<Box<dyn RegistryChangeListener>>>,

    /// Consulted before removal, always outside the map lock
    authorizer: Arc<dyn AuthorizationService>,
}

impl ExchangeRegistry {
    /// Create a registry for the named virtual host
    pub fn new(vhost_name: impl Into<String>, authorizer: Arc<dyn AuthorizationService>) -> Self {
        let vhost_name = vhost_name.into();
        let default_exchange = Arc::new(Exchange::default_exchange(&vhost_name));
        Self {
            vhost_name,
            exchanges: RwLock::new(HashMap::new()),
            default_exchange,
            registered_types: RwLock::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            authorizer,
        }
    }

    /// Virtual host name this registry belongs to
    pub fn vhost_name(&self) -> &str {
        &self.vhost_name
    }

    /// Create the standard exchange for every type the factory knows
    ///
    /// Idempotent: types whose canonical exchange already exists are
    /// skipped. Durable standard exchanges are persisted through `store`.
    /// An unresolvable type or alternate reference aborts broker startup.
    pub async fn initialise(
        &self,
        factory: &dyn ExchangeFactory,
        store: &dyn DurableStore,
    ) -> Result<(), RegistryError> {
        let types = factory.registered_types();
        *self.registered_types.write().await = types.clone();

        for descriptor in &types {
            self.define_standard_exchange(factory, store, descriptor)
                .await?;
        }

        tracing::info!(
            vhost = %self.vhost_name,
            types = types.len(),
            "Standard exchanges initialised"
        );
        Ok(())
    }

    async fn define_standard_exchange(
        &self,
        factory: &dyn ExchangeFactory,
        store: &dyn DurableStore,
        descriptor: &ExchangeTypeDescriptor,
    ) -> Result<(), RegistryError> {
        if self.exchange(Some(&descriptor.default_name)).await.is_some() {
            return Ok(());
        }

        let attrs = ExchangeAttributes {
            id: ids::exchange_uuid(&descriptor.default_name, &self.vhost_name),
            name: descriptor.default_name.clone(),
            kind: descriptor.kind.clone(),
            durable: true,
            alternate: None,
        };

        let exchange = factory.create_exchange(attrs).map_err(|e| match e {
            FactoryError::UnknownExchangeType(tag) => RegistryError::UnknownExchangeType(tag),
            FactoryError::UnknownAlternateExchange { exchange, .. } => {
                RegistryError::UnknownAlternateExchange(exchange)
            }
        })?;

        self.register(Arc::clone(&exchange)).await;

        if exchange.is_durable() {
            store
                .persist_exchange_create(&exchange)
                .map_err(|source| RegistryError::Store {
                    exchange: exchange.name().to_string(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Register an exchange under its name
    ///
    /// Overwrites any prior mapping for the name (callers check-then-create)
    /// and notifies every listener of the new exchange. The name must be
    /// non-empty: the empty name is how clients address the default-exchange
    /// sentinel, so a map entry under it would be unreachable through
    /// lookup. [`Exchange::new`] asserts this.
    pub async fn register(&self, exchange: Arc<Exchange>) {
        self.exchanges
            .write()
            .await
            .insert(exchange.name().to_string(), Arc::clone(&exchange));

        let listeners = self.listeners.lock().await;
        for listener in listeners.iter() {
            listener.exchange_registered(&exchange);
        }
        drop(listeners);

        tracing::info!(
            exchange = %exchange.name(),
            vhost = %self.vhost_name,
            kind = %exchange.kind(),
            durable = exchange.is_durable(),
            "Exchange registered"
        );
    }

    /// Remove the exchange registered under `name`
    ///
    /// Returns `Ok(false)` when no such exchange exists; probing an absent
    /// name is routine, and a concurrent removal by another actor is a
    /// valid race. On success the exchange is closed and listeners are
    /// notified of the removal exactly once.
    ///
    /// The `in_use` hint is accepted but not yet enforced.
    pub async fn unregister(&self, name: &str, in_use: bool) -> Result<bool, RegistryError> {
        let _ = in_use;

        let existing = self.exchanges.read().await.get(name).cloned();
        let Some(exchange) = existing else {
            return Ok(false);
        };

        if !self.authorizer.authorize_delete(&exchange) {
            tracing::warn!(
                exchange = %name,
                vhost = %self.vhost_name,
                "Exchange delete denied"
            );
            return Err(RegistryError::DeleteDenied(name.to_string()));
        }

        // Compare-and-remove: if a concurrent unregister already removed
        // this name, skip close/notify so they fire exactly once.
        let removed = self.exchanges.write().await.remove(name);
        if let Some(removed) = removed {
            removed.close();

            let listeners = self.listeners.lock().await;
            for listener in listeners.iter() {
                listener.exchange_unregistered(&removed);
            }
            drop(listeners);

            tracing::info!(
                exchange = %name,
                vhost = %self.vhost_name,
                "Exchange unregistered"
            );
        }

        Ok(true)
    }

    /// Look up an exchange by name
    ///
    /// The empty or absent name resolves to the default exchange.
    pub async fn exchange(&self, name: Option<&str>) -> Option<Arc<Exchange>> {
        match name {
            None | Some("") => Some(Arc::clone(&self.default_exchange)),
            Some(name) => self.exchanges.read().await.get(name).cloned(),
        }
    }

    /// Look up an exchange by id
    ///
    /// The absent id resolves to the default exchange, for parity with name
    /// lookup. Otherwise a linear scan over the current exchanges; exchange
    /// cardinality per virtual host is tens, not millions.
    pub async fn exchange_by_id(&self, id: Option<Uuid>) -> Option<Arc<Exchange>> {
        let Some(id) = id else {
            return Some(Arc::clone(&self.default_exchange));
        };
        self.exchanges
            .read()
            .await
            .values()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// The virtual host's default exchange sentinel
    pub fn default_exchange(&self) -> Arc<Exchange> {
        Arc::clone(&self.default_exchange)
    }

    /// Whether a name may not be used for a client-declared exchange
    ///
    /// Reserved: the absent name, the canonical default-exchange name, the
    /// broker-reserved prefixes, and the default name of any registered
    /// exchange type. Declare operations must consult this before creating.
    pub async fn is_reserved_name(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return true;
        };
        if name == DEFAULT_EXCHANGE_NAME
            || RESERVED_PREFIXES.iter().any(|p| name.starts_with(*p))
        {
            return true;
        }
        self.registered_types
            .read()
            .await
            .iter()
            .any(|t| t.default_name == name)
    }

    /// Point-in-time snapshot of the registered exchanges
    ///
    /// Never includes the default exchange; order is unspecified.
    pub async fn exchanges(&self) -> Vec<Arc<Exchange>> {
        self.exchanges.read().await.values().cloned().collect()
    }

    /// Number of registered exchanges
    pub async fn exchange_count(&self) -> usize {
        self.exchanges.read().await.len()
    }

    /// Register a listener for future registration changes
    ///
    /// Past events are not replayed.
    pub async fn add_listener(&self, listener: Box<dyn RegistryChangeListener>) {
        self.listeners.lock().await.push(listener);
    }

    /// Notify listeners of removal for every current exchange, then empty
    /// the map
    ///
    /// Used on virtual-host teardown. The exchanges themselves are not
    /// closed; ownership may be passing to a replica.
    pub async fn clear(&self) {
        let drained: Vec<Arc<Exchange>> = {
            let mut map = self.exchanges.write().await;
            map.drain().map(|(_, exchange)| exchange).collect()
        };

        let listeners = self.listeners.lock().await;
        for exchange in &drained {
            for listener in listeners.iter() {
                listener.exchange_unregistered(exchange);
            }
        }
        drop(listeners);

        tracing::info!(
            vhost = %self.vhost_name,
            removed = drained.len(),
            "Exchange registry cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::exchange::types::{ExchangeKind, StandardExchangeFactory};

    struct AllowAll;
    impl AuthorizationService for AllowAll {
        fn authorize_delete(&self, _exchange: &Exchange) -> bool {
            true
        }
    }

    struct DenyAll;
    impl AuthorizationService for DenyAll {
        fn authorize_delete(&self, _exchange: &Exchange) -> bool {
            false
        }
    }

    struct MemoryStore {
        persisted: StdMutex<Vec<String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                persisted: StdMutex::new(Vec::new()),
            }
        }
    }

    impl DurableStore for MemoryStore {
        fn persist_exchange_create(&self, exchange: &Exchange) -> Result<(), StoreError> {
            self.persisted
                .lock()
                .unwrap()
                .push(exchange.name().to_string());
            Ok(())
        }
    }

    struct FailingStore;
    impl DurableStore for FailingStore {
        fn persist_exchange_create(&self, _exchange: &Exchange) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
    }

    struct Recording {
        events: Arc<StdMutex<Vec<String>>>,
    }

    impl RegistryChangeListener for Recording {
        fn exchange_registered(&self, exchange: &Arc<Exchange>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("+{}", exchange.name()));
        }
        fn exchange_unregistered(&self, exchange: &Arc<Exchange>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("-{}", exchange.name()));
        }
    }

    fn registry() -> ExchangeRegistry {
        ExchangeRegistry::new("test", Arc::new(AllowAll))
    }

    fn exchange(name: &str) -> Arc<Exchange> {
        Arc::new(Exchange::new(ExchangeAttributes {
            id: ids::exchange_uuid(name, "test"),
            name: name.to_string(),
            kind: ExchangeKind::Direct,
            durable: false,
            alternate: None,
        }))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry();
        registry.register(exchange("orders")).await;

        let found = registry.exchange(Some("orders")).await.unwrap();
        assert_eq!(found.name(), "orders");
        assert!(registry.exchange(Some("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_default_exchange_for_empty_and_absent_names() {
        let registry = registry();
        registry.register(exchange("orders")).await;

        let by_empty = registry.exchange(Some("")).await.unwrap();
        let by_none = registry.exchange(None).await.unwrap();
        let by_no_id = registry.exchange_by_id(None).await.unwrap();

        assert!(Arc::ptr_eq(&by_empty, &by_none));
        assert!(Arc::ptr_eq(&by_empty, &by_no_id));
        assert!(by_empty.is_default());

        // The sentinel never shows up in enumeration
        let all = registry.exchanges().await;
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|e| !e.is_default()));
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let registry = registry();
        let orders = exchange("orders");
        let id = orders.id();
        registry.register(orders).await;
        registry.register(exchange("invoices")).await;

        let found = registry.exchange_by_id(Some(id)).await.unwrap();
        assert_eq!(found.name(), "orders");
        assert!(registry
            .exchange_by_id(Some(ids::random_uuid()))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unregister_twice() {
        let registry = registry();
        let events = Arc::new(StdMutex::new(Vec::new()));
        registry
            .add_listener(Box::new(Recording {
                events: Arc::clone(&events),
            }))
            .await;

        let orders = exchange("orders");
        registry.register(Arc::clone(&orders)).await;

        assert!(registry.unregister("orders", false).await.unwrap());
        assert!(orders.is_closed());
        assert!(!registry.unregister("orders", false).await.unwrap());

        let events = events.lock().unwrap();
        let removals = events.iter().filter(|e| *e == "-orders").count();
        assert_eq!(removals, 1);
    }

    #[tokio::test]
    async fn test_unregister_denied_leaves_registry_unchanged() {
        let registry = ExchangeRegistry::new("test", Arc::new(DenyAll));
        registry.register(exchange("orders")).await;

        let result = registry.unregister("orders", false).await;
        assert!(matches!(result, Err(RegistryError::DeleteDenied(_))));
        assert!(registry.exchange(Some("orders")).await.is_some());
    }

    #[tokio::test]
    async fn test_register_overwrites_prior_mapping() {
        let registry = registry();
        let first = exchange("orders");
        let second = exchange("orders");
        registry.register(Arc::clone(&first)).await;
        registry.register(Arc::clone(&second)).await;

        let found = registry.exchange(Some("orders")).await.unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(registry.exchange_count().await, 1);
    }

    #[tokio::test]
    async fn test_listener_ordering() {
        let registry = registry();
        let events = Arc::new(StdMutex::new(Vec::new()));
        registry
            .add_listener(Box::new(Recording {
                events: Arc::clone(&events),
            }))
            .await;

        registry.register(exchange("a")).await;
        registry.register(exchange("b")).await;
        registry.unregister("a", false).await.unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["+a", "+b", "-a"]);
    }

    #[tokio::test]
    async fn test_initialise_creates_standard_exchanges() {
        let registry = registry();
        let factory = StandardExchangeFactory::new();
        let store = MemoryStore::new();

        registry.initialise(&factory, &store).await.unwrap();

        assert_eq!(registry.exchange_count().await, 4);
        let direct = registry.exchange(Some("amq.direct")).await.unwrap();
        assert!(direct.is_durable());
        assert_eq!(direct.id(), ids::exchange_uuid("amq.direct", "test"));

        // All four are durable and persisted
        assert_eq!(store.persisted.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_initialise_idempotent() {
        let registry = registry();
        let factory = StandardExchangeFactory::new();
        let store = MemoryStore::new();

        registry.initialise(&factory, &store).await.unwrap();
        let before = registry.exchange(Some("amq.topic")).await.unwrap();
        registry.initialise(&factory, &store).await.unwrap();
        let after = registry.exchange(Some("amq.topic")).await.unwrap();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(registry.exchange_count().await, 4);
        assert_eq!(store.persisted.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_initialise_unknown_type_is_fatal() {
        struct BrokenFactory;
        impl ExchangeFactory for BrokenFactory {
            fn registered_types(&self) -> Vec<ExchangeTypeDescriptor> {
                vec![ExchangeTypeDescriptor::new(
                    ExchangeKind::Custom("x-delay".to_string()),
                    "amq.delay",
                )]
            }
            fn create_exchange(
                &self,
                attrs: ExchangeAttributes,
            ) -> Result<Arc<Exchange>, FactoryError> {
                Err(FactoryError::UnknownExchangeType(attrs.kind.tag().to_string()))
            }
        }

        let registry = registry();
        let result = registry.initialise(&BrokenFactory, &MemoryStore::new()).await;
        assert!(matches!(result, Err(RegistryError::UnknownExchangeType(_))));
    }

    #[tokio::test]
    async fn test_initialise_unknown_alternate_is_fatal() {
        struct AlternateFactory;
        impl ExchangeFactory for AlternateFactory {
            fn registered_types(&self) -> Vec<ExchangeTypeDescriptor> {
                vec![ExchangeTypeDescriptor::new(ExchangeKind::Direct, "amq.direct")]
            }
            fn create_exchange(
                &self,
                attrs: ExchangeAttributes,
            ) -> Result<Arc<Exchange>, FactoryError> {
                Err(FactoryError::UnknownAlternateExchange {
                    exchange: attrs.name,
                    alternate: "missing.alternate".to_string(),
                })
            }
        }

        let registry = registry();
        let err = registry
            .initialise(&AlternateFactory, &MemoryStore::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("amq.direct"));
        match err {
            RegistryError::UnknownAlternateExchange(name) => assert_eq!(name, "amq.direct"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_initialise_store_failure_is_fatal() {
        let registry = registry();
        let result = registry
            .initialise(&StandardExchangeFactory::new(), &FailingStore)
            .await;
        assert!(matches!(result, Err(RegistryError::Store { .. })));
    }

    #[tokio::test]
    async fn test_reserved_names() {
        let registry = registry();
        registry
            .initialise(&StandardExchangeFactory::new(), &MemoryStore::new())
            .await
            .unwrap();

        assert!(registry.is_reserved_name(None).await);
        assert!(registry.is_reserved_name(Some(DEFAULT_EXCHANGE_NAME)).await);
        assert!(registry.is_reserved_name(Some("amq.foo")).await);
        assert!(registry.is_reserved_name(Some("qpid.x")).await);
        assert!(registry.is_reserved_name(Some("amq.match")).await);
        assert!(!registry.is_reserved_name(Some("orders")).await);
    }

    #[tokio::test]
    async fn test_clear_notifies_and_empties() {
        let registry = registry();
        let events = Arc::new(StdMutex::new(Vec::new()));
        registry
            .add_listener(Box::new(Recording {
                events: Arc::clone(&events),
            }))
            .await;

        registry.register(exchange("a")).await;
        registry.register(exchange("b")).await;
        registry.clear().await;

        assert_eq!(registry.exchange_count().await, 0);
        let events = events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| e.starts_with('-')).count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_registration_no_lost_updates() {
        let registry = Arc::new(registry());

        let mut handles = Vec::new();
        for worker in 0..8u32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                for i in 0..125u32 {
                    registry
                        .register(exchange(&format!("ex-{}-{}", worker, i)))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.exchange_count().await, 1000);
        // Spot-check independent lookups
        assert!(registry.exchange(Some("ex-0-0")).await.is_some());
        assert!(registry.exchange(Some("ex-7-124")).await.is_some());
    }
}
