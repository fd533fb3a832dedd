//! Consumer management adapter

use std::sync::Arc;

use uuid::Uuid;

use crate::ids;
use crate::protocol::model::ConsumerModel;

use super::Identifiable;

/// How a consumer takes messages from its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Messages are acquired and leave the queue
    Move,
    /// Messages are copied; the queue keeps them
    Copy,
}

impl std::fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionMode::Move => f.write_str("MOVE"),
            AcquisitionMode::Copy => f.write_str("COPY"),
        }
    }
}

/// Connection-level facts a consumer's identity derivation needs,
/// threaded down through the session adapter
#[derive(Debug, Clone)]
pub struct ConsumerScope {
    pub virtual_host: String,
    pub remote_address: String,
}

/// Management view of one live consumer
pub struct ConsumerAdapter {
    id: Uuid,
    model: Arc<dyn ConsumerModel>,
}

impl ConsumerAdapter {
    /// Wrap a live consumer
    ///
    /// The adapter id is derived from (virtual host, queue, remote address,
    /// channel, consumer name), so rebuilding the adapter for the same
    /// underlying consumer yields the same id.
    pub fn new(model: Arc<dyn ConsumerModel>, scope: &ConsumerScope, channel_id: u32) -> Self {
        let id = ids::consumer_uuid(
            &scope.virtual_host,
            &model.queue_name(),
            &scope.remote_address,
            channel_id,
            &model.name(),
        );
        Self { id, model }
    }

    pub fn queue_name(&self) -> String {
        self.model.queue_name()
    }

    pub fn acquisition_mode(&self) -> AcquisitionMode {
        if self.model.acquires() {
            AcquisitionMode::Move
        } else {
            AcquisitionMode::Copy
        }
    }

    pub fn bytes_out(&self) -> u64 {
        self.model.bytes_out()
    }

    pub fn messages_out(&self) -> u64 {
        self.model.messages_out()
    }

    pub fn unacknowledged_bytes(&self) -> u64 {
        self.model.unacknowledged_bytes()
    }

    pub fn unacknowledged_messages(&self) -> u64 {
        self.model.unacknowledged_messages()
    }
}

impl Identifiable for ConsumerAdapter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> String {
        self.model.name()
    }
}
