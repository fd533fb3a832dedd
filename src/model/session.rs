//! Session management adapter

use std::sync::Arc;

use uuid::Uuid;

use crate::ids;
use crate::protocol::model::{ConsumerModel, SessionModel};

use super::consumer::{ConsumerAdapter, ConsumerScope};
use super::reconcile::{ChildListener, ChildSet};
use super::Identifiable;

/// Management view of one live session
pub struct SessionAdapter {
    id: Uuid,
    model: Arc<dyn SessionModel>,
    scope: ConsumerScope,
    consumers: ChildSet<u64, ConsumerAdapter>,
}

impl SessionAdapter {
    pub fn new(model: Arc<dyn SessionModel>, scope: ConsumerScope) -> Self {
        Self {
            id: ids::random_uuid(),
            model,
            scope,
            consumers: ChildSet::new(),
        }
    }

    pub fn channel_id(&self) -> u32 {
        self.model.channel_id()
    }

    pub fn is_producer_flow_blocked(&self) -> bool {
        self.model.is_producer_flow_blocked()
    }

    pub fn transaction_begins(&self) -> u64 {
        self.model.transaction_begins()
    }

    pub fn transaction_commits(&self) -> u64 {
        self.model.transaction_commits()
    }

    /// Current consumer adapters, reconciled against the live consumer set
    pub async fn consumers(&self) -> Vec<Arc<ConsumerAdapter>> {
        let live: Vec<(u64, Arc<dyn ConsumerModel>)> = self
            .model
            .consumer_models()
            .into_iter()
            .map(|model| (model.consumer_id(), model))
            .collect();

        let scope = self.scope.clone();
        let channel_id = self.model.channel_id();
        self.consumers
            .reconcile(live, |model| {
                Arc::new(ConsumerAdapter::new(model, &scope, channel_id))
            })
            .await
    }

    /// Fetch the adapter for one consumer, reconciling first so the lookup
    /// reflects any external mutation
    pub async fn consumer_adapter(&self, consumer_id: u64) -> Option<Arc<ConsumerAdapter>> {
        self.consumers().await;
        self.consumers.get(&consumer_id).await
    }

    pub async fn add_consumer_listener(&self, listener: Box<dyn ChildListener<ConsumerAdapter>>) {
        self.consumers.add_listener(listener).await;
    }
}

impl Identifiable for SessionAdapter {
    fn id(&self) -> Uuid {
        self.id
    }

    /// Sessions are named by their channel number
    fn name(&self) -> String {
        self.model.channel_id().to_string()
    }
}
