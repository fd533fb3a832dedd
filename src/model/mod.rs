//! Management model
//!
//! Read-mostly adapter views over the live protocol objects, for operators
//! and monitoring. The adapter tree mirrors broker → connections →
//! sessions → consumers; each parent keeps a reconciling cache of child
//! adapters ([`ChildSet`]) that is brought up to date lazily whenever the
//! children are queried, so management reads never lock out the protocol
//! path.
//!
//! Adapters never mutate the objects they wrap; the only control surface is
//! the narrow [`Deletable`] close operation.

pub mod connection;
pub mod consumer;
pub mod reconcile;
pub mod session;
pub mod tree;

use uuid::Uuid;

pub use connection::ConnectionAdapter;
pub use consumer::{AcquisitionMode, ConsumerAdapter, ConsumerScope};
pub use reconcile::{ChildListener, ChildSet};
pub use session::SessionAdapter;
pub use tree::ManagementTree;

/// An entity with a stable id and a display name
pub trait Identifiable {
    fn id(&self) -> Uuid;
    fn name(&self) -> String;
}

/// An entity that can be removed through the management interface
pub trait Deletable {
    fn delete(&self);
}
