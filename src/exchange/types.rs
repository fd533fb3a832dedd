//! Exchange types and the factory collaborator
//!
//! Exchange kinds are a closed set of built-ins plus an escape hatch for
//! plugin-provided kinds. Each kind has a canonical standard exchange
//! (e.g. `amq.direct`) that every virtual host creates at bootstrap.

use std::sync::Arc;

use uuid::Uuid;

use super::exchange::{AlternateExchange, Exchange};

/// Exchange type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    Direct,
    Topic,
    Fanout,
    Headers,
    /// Plugin-provided kind, identified by its registered tag
    Custom(String),
}

impl ExchangeKind {
    /// The wire/management tag for this kind
    pub fn tag(&self) -> &str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Headers => "headers",
            ExchangeKind::Custom(tag) => tag,
        }
    }
}

impl std::fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A registered exchange type: its tag plus the canonical name of the
/// standard exchange instance every virtual host carries for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeTypeDescriptor {
    pub kind: ExchangeKind,
    pub default_name: String,
}

impl ExchangeTypeDescriptor {
    pub fn new(kind: ExchangeKind, default_name: impl Into<String>) -> Self {
        Self {
            kind,
            default_name: default_name.into(),
        }
    }
}

/// Declared attributes of an exchange, resolved to concrete types
#[derive(Debug, Clone)]
pub struct ExchangeAttributes {
    pub id: Uuid,
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub alternate: Option<AlternateExchange>,
}

/// Error from exchange construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// The requested type tag is not registered with this factory
    UnknownExchangeType(String),
    /// The alternate-exchange reference could not be resolved
    UnknownAlternateExchange {
        exchange: String,
        alternate: String,
    },
}

impl std::fmt::Display for FactoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactoryError::UnknownExchangeType(tag) => {
                write!(f, "Unknown exchange type: '{}'", tag)
            }
            FactoryError::UnknownAlternateExchange { exchange, alternate } => {
                write!(
                    f,
                    "Unknown alternate exchange '{}' on exchange '{}'",
                    alternate, exchange
                )
            }
        }
    }
}

impl std::error::Error for FactoryError {}

/// Constructs exchange instances and enumerates the known exchange types
///
/// Implemented by the plugin layer; [`StandardExchangeFactory`] covers the
/// built-in AMQP types.
pub trait ExchangeFactory: Send + Sync {
    /// Types this factory can construct, each with its canonical standard
    /// exchange name
    fn registered_types(&self) -> Vec<ExchangeTypeDescriptor>;

    /// Construct an exchange from declared attributes
    fn create_exchange(&self, attrs: ExchangeAttributes) -> Result<Arc<Exchange>, FactoryError>;
}

/// Factory for the built-in AMQP exchange types
#[derive(Debug, Default)]
pub struct StandardExchangeFactory;

impl StandardExchangeFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ExchangeFactory for StandardExchangeFactory {
    fn registered_types(&self) -> Vec<ExchangeTypeDescriptor> {
        vec![
            ExchangeTypeDescriptor::new(ExchangeKind::Direct, "amq.direct"),
            ExchangeTypeDescriptor::new(ExchangeKind::Topic, "amq.topic"),
            ExchangeTypeDescriptor::new(ExchangeKind::Fanout, "amq.fanout"),
            ExchangeTypeDescriptor::new(ExchangeKind::Headers, "amq.match"),
        ]
    }

    fn create_exchange(&self, attrs: ExchangeAttributes) -> Result<Arc<Exchange>, FactoryError> {
        if let ExchangeKind::Custom(tag) = &attrs.kind {
            return Err(FactoryError::UnknownExchangeType(tag.clone()));
        }
        Ok(Arc::new(Exchange::new(attrs)))
    }
}
