//! Connection management adapter

use std::sync::Arc;

use uuid::Uuid;

use crate::ids;
use crate::protocol::connection::Transport;
use crate::protocol::model::{ConnectionModel, SessionModel};

use super::consumer::ConsumerScope;
use super::reconcile::{ChildListener, ChildSet};
use super::session::SessionAdapter;
use super::{Deletable, Identifiable};

/// Management view of one live connection
///
/// The set of session adapters is a derived cache over the protocol
/// layer's authoritative session list, refreshed whenever it is queried.
pub struct ConnectionAdapter {
    id: Uuid,
    model: Arc<dyn ConnectionModel>,
    scope: ConsumerScope,
    sessions: ChildSet<u64, SessionAdapter>,
}

impl ConnectionAdapter {
    pub fn new(model: Arc<dyn ConnectionModel>) -> Self {
        let scope = ConsumerScope {
            virtual_host: model.virtual_host_name(),
            remote_address: model.remote_address(),
        };
        Self {
            id: ids::random_uuid(),
            model,
            scope,
            sessions: ChildSet::new(),
        }
    }

    pub fn remote_address(&self) -> String {
        self.model.remote_address()
    }

    pub fn client_id(&self) -> Option<String> {
        self.model.client_id()
    }

    pub fn client_version(&self) -> Option<String> {
        self.model.client_version()
    }

    pub fn virtual_host_name(&self) -> String {
        self.model.virtual_host_name()
    }

    pub fn transport(&self) -> Transport {
        self.model.transport()
    }

    pub fn port(&self) -> u16 {
        self.model.port()
    }

    pub fn bytes_in(&self) -> u64 {
        self.model.bytes_in()
    }

    pub fn bytes_out(&self) -> u64 {
        self.model.bytes_out()
    }

    pub fn messages_in(&self) -> u64 {
        self.model.messages_in()
    }

    pub fn messages_out(&self) -> u64 {
        self.model.messages_out()
    }

    pub fn session_count(&self) -> usize {
        self.model.session_models().len()
    }

    /// Current session adapters, reconciled against the live session set
    pub async fn sessions(&self) -> Vec<Arc<SessionAdapter>> {
        let live: Vec<(u64, Arc<dyn SessionModel>)> = self
            .model
            .session_models()
            .into_iter()
            .map(|model| (model.session_id(), model))
            .collect();

        let scope = self.scope.clone();
        self.sessions
            .reconcile(live, |model| {
                Arc::new(SessionAdapter::new(model, scope.clone()))
            })
            .await
    }

    /// Fetch the adapter for one session, reconciling first so the lookup
    /// reflects any external mutation
    pub async fn session_adapter(&self, session_id: u64) -> Option<Arc<SessionAdapter>> {
        self.sessions().await;
        self.sessions.get(&session_id).await
    }

    pub async fn add_session_listener(&self, listener: Box<dyn ChildListener<SessionAdapter>>) {
        self.sessions.add_listener(listener).await;
    }
}

impl Identifiable for ConnectionAdapter {
    fn id(&self) -> Uuid {
        self.id
    }

    /// Connections are named by remote address, path separators removed
    fn name(&self) -> String {
        self.model.remote_address().replace('/', "")
    }
}

impl Deletable for ConnectionAdapter {
    fn delete(&self) {
        self.model.close("Connection closed by external action");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::model::testing::{MockConnection, MockSession};

    #[tokio::test]
    async fn test_sessions_track_live_set_and_reuse_adapters() {
        let conn = MockConnection::new(1, "10.0.0.1:51234");
        conn.set_sessions(vec![MockSession::new(100, 1), MockSession::new(101, 2)]);
        let adapter = ConnectionAdapter::new(conn.clone());

        let first = adapter.sessions().await;
        assert_eq!(first.len(), 2);
        let kept = adapter.session_adapter(101).await.unwrap();

        conn.set_sessions(vec![MockSession::new(101, 2), MockSession::new(102, 3)]);

        let second = adapter.sessions().await;
        assert_eq!(second.len(), 2);
        assert!(adapter.session_adapter(100).await.is_none());
        assert!(Arc::ptr_eq(&kept, &adapter.session_adapter(101).await.unwrap()));
    }

    #[tokio::test]
    async fn test_reborn_session_gets_new_adapter() {
        let conn = MockConnection::new(1, "10.0.0.1:51234");
        conn.set_sessions(vec![MockSession::new(100, 1)]);
        let adapter = ConnectionAdapter::new(conn.clone());
        let before = adapter.session_adapter(100).await.unwrap();

        // Same channel, different identity: removal then addition
        conn.set_sessions(vec![MockSession::new(200, 1)]);
        adapter.sessions().await;

        assert!(adapter.session_adapter(100).await.is_none());
        let after = adapter.session_adapter(200).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_session_listener_events() {
        struct Recording {
            events: Arc<StdMutex<Vec<String>>>,
        }
        impl ChildListener<SessionAdapter> for Recording {
            fn child_added(&self, child: &Arc<SessionAdapter>) {
                self.events.lock().unwrap().push(format!("+{}", child.name()));
            }
            fn child_removed(&self, child: &Arc<SessionAdapter>) {
                self.events.lock().unwrap().push(format!("-{}", child.name()));
            }
        }

        let conn = MockConnection::new(1, "10.0.0.1:51234");
        let adapter = ConnectionAdapter::new(conn.clone());
        let events = Arc::new(StdMutex::new(Vec::new()));
        adapter
            .add_session_listener(Box::new(Recording {
                events: Arc::clone(&events),
            }))
            .await;

        conn.set_sessions(vec![MockSession::new(100, 1)]);
        adapter.sessions().await;
        conn.set_sessions(vec![]);
        adapter.sessions().await;

        assert_eq!(*events.lock().unwrap(), vec!["+1", "-1"]);
    }

    #[tokio::test]
    async fn test_name_strips_separators() {
        let conn = MockConnection::new(1, "/10.0.0.1:51234");
        let adapter = ConnectionAdapter::new(conn);
        assert_eq!(adapter.name(), "10.0.0.1:51234");
    }

    #[tokio::test]
    async fn test_delete_closes_underlying_connection() {
        let conn = MockConnection::new(1, "10.0.0.1:51234");
        let adapter = ConnectionAdapter::new(conn.clone());

        adapter.delete();

        assert_eq!(
            conn.closed_with.lock().unwrap().as_deref(),
            Some("Connection closed by external action")
        );
    }
}
