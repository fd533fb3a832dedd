//! Broker-level management tree
//!
//! Entry point for the management view: enumerates connection adapters
//! over the transport layer's live connection set using the same
//! reconciliation routine the lower levels use, so the whole
//! broker → connections → sessions → consumers walk is uniformly fresh.

use std::sync::Arc;

use crate::protocol::model::{ConnectionModel, ConnectionSource};

use super::connection::ConnectionAdapter;
use super::reconcile::{ChildListener, ChildSet};

/// Root of the management adapter tree
pub struct ManagementTree {
    source: Arc<dyn ConnectionSource>,
    connections: ChildSet<u64, ConnectionAdapter>,
}

impl ManagementTree {
    pub fn new(source: Arc<dyn ConnectionSource>) -> Self {
        Self {
            source,
            connections: ChildSet::new(),
        }
    }

    /// Current connection adapters, reconciled against the live set
    pub async fn connections(&self) -> Vec<Arc<ConnectionAdapter>> {
        let live: Vec<(u64, Arc<dyn ConnectionModel>)> = self
            .source
            .connection_models()
            .into_iter()
            .map(|model| (model.connection_id(), model))
            .collect();

        self.connections
            .reconcile(live, |model| Arc::new(ConnectionAdapter::new(model)))
            .await
    }

    /// Fetch the adapter for one connection, reconciling first
    pub async fn connection_adapter(&self, connection_id: u64) -> Option<Arc<ConnectionAdapter>> {
        self.connections().await;
        self.connections.get(&connection_id).await
    }

    pub async fn add_connection_listener(
        &self,
        listener: Box<dyn ChildListener<ConnectionAdapter>>,
    ) {
        self.connections.add_listener(listener).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{MockBroker, MockConnection, MockConsumer, MockSession};
    use crate::model::Identifiable;

    #[tokio::test]
    async fn test_walk_full_tree() {
        let broker = MockBroker::new();
        let conn = MockConnection::new(1, "10.0.0.1:51234");
        let session = MockSession::new(100, 1);
        session.set_consumers(vec![MockConsumer::new(1000, "ctag-1", "orders")]);
        conn.set_sessions(vec![session]);
        broker.set_connections(vec![conn]);

        let tree = ManagementTree::new(broker);

        let connections = tree.connections().await;
        assert_eq!(connections.len(), 1);
        let sessions = connections[0].sessions().await;
        assert_eq!(sessions.len(), 1);
        let consumers = sessions[0].consumers().await;
        assert_eq!(consumers.len(), 1);
        assert_eq!(consumers[0].name(), "ctag-1");
    }

    #[tokio::test]
    async fn test_connection_churn() {
        let broker = MockBroker::new();
        let survivor = MockConnection::new(2, "b:2");
        broker.set_connections(vec![MockConnection::new(1, "a:1"), survivor.clone()]);
        let tree = ManagementTree::new(broker.clone());

        tree.connections().await;
        let kept = tree.connection_adapter(2).await.unwrap();

        broker.set_connections(vec![survivor, MockConnection::new(3, "c:3")]);
        let now = tree.connections().await;

        assert_eq!(now.len(), 2);
        assert!(tree.connection_adapter(1).await.is_none());
        assert!(Arc::ptr_eq(&kept, &tree.connection_adapter(2).await.unwrap()));
    }
}
