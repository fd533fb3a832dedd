//! Generic child-adapter reconciliation
//!
//! The protocol layer owns the authoritative child sets (a connection's
//! sessions, a session's consumers); the management model keeps a derived
//! cache of adapters keyed by child identity. [`ChildSet::reconcile`] diffs
//! the cache against a snapshot of the live keys: adapters for vanished
//! keys are discarded with a removed notification, new keys get freshly
//! constructed adapters with an added notification, and surviving keys
//! keep their adapter instance so repeated queries churn nothing.
//!
//! The same routine backs every level of the hierarchy; the two levels must
//! treat "vanished" and "new" identically, so the diff lives in exactly one
//! place.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Listener notified as a parent's child adapters come and go
///
/// Dispatched synchronously in registration order while the parent's cache
/// lock is held; keep callbacks cheap.
pub trait ChildListener<V>: Send {
    fn child_added(&self, child: &Arc<V>);
    fn child_removed(&self, child: &Arc<V>);
}

/// Reconciling cache of child adapters for one parent
///
/// Each instance owns a private lock, so reconciliation of one parent's
/// children is linearizable with respect to itself while different parents
/// reconcile independently. Identity equality of keys drives the diff: a
/// key that vanishes and reappears as a different object is a removal
/// followed by an addition, never an update in place.
pub struct ChildSet<K, V> {
    children: Mutex<HashMap<K, Arc<V>>>,
    listeners: Mutex<Vec<Box<dyn ChildListener<V>>>>,
}

impl<K, V> ChildSet<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            children: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener for future added/removed events
    pub async fn add_listener(&self, listener: Box<dyn ChildListener<V>>) {
        self.listeners.lock().await.push(listener);
    }

    /// Bring the cache up to date with the live key snapshot
    ///
    /// `live` pairs each current key with whatever `make` needs to build an
    /// adapter for it. Removed notifications fire before added ones.
    /// Returns a snapshot of the resulting adapters in no guaranteed order.
    pub async fn reconcile<M, F>(&self, live: Vec<(K, M)>, mut make: F) -> Vec<Arc<V>>
    where
        F: FnMut(M) -> Arc<V>,
    {
        let mut children = self.children.lock().await;

        let live_keys: HashSet<K> = live.iter().map(|(key, _)| key.clone()).collect();
        let stale: Vec<K> = children
            .keys()
            .filter(|key| !live_keys.contains(key))
            .cloned()
            .collect();

        let mut removed = Vec::new();
        for key in stale {
            if let Some(child) = children.remove(&key) {
                removed.push(child);
            }
        }

        let mut added = Vec::new();
        for (key, model) in live {
            if !children.contains_key(&key) {
                let child = make(model);
                children.insert(key, Arc::clone(&child));
                added.push(child);
            }
        }

        if !removed.is_empty() || !added.is_empty() {
            let listeners = self.listeners.lock().await;
            for child in &removed {
                for listener in listeners.iter() {
                    listener.child_removed(child);
                }
            }
            for child in &added {
                for listener in listeners.iter() {
                    listener.child_added(child);
                }
            }
        }

        children.values().cloned().collect()
    }

    /// Fetch the cached adapter for a key, if present
    ///
    /// Callers wanting lookup-after-mutation freshness reconcile first; the
    /// parent adapters expose that combined operation.
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        self.children.lock().await.get(key).cloned()
    }

    /// Number of cached adapters
    pub async fn len(&self) -> usize {
        self.children.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.children.lock().await.is_empty()
    }
}

impl<K, V> Default for ChildSet<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
