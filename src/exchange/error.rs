//! Registry error types

/// Error from a durable-store collaborator
#[derive(Debug, Clone)]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Durable store failure: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

/// Error type for exchange registry operations
///
/// Lookup misses are not represented here; probing is routine and returns
/// `Option`. The bootstrap variants abort broker startup: they indicate a
/// missing or misconfigured deployment, not a transient condition.
#[derive(Debug)]
pub enum RegistryError {
    /// Exchange removal rejected by the authorization collaborator
    DeleteDenied(String),
    /// A mandatory exchange type could not be resolved at bootstrap
    UnknownExchangeType(String),
    /// A mandatory exchange unexpectedly carried an alternate-exchange
    /// reference at bootstrap (mandatory exchanges never have one)
    UnknownAlternateExchange(String),
    /// Durable store write failed while persisting a standard exchange
    Store {
        exchange: String,
        source: StoreError,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DeleteDenied(name) => {
                write!(f, "Delete of exchange '{}' denied", name)
            }
            RegistryError::UnknownExchangeType(tag) => {
                write!(
                    f,
                    "Unknown exchange type '{}' while initialising standard exchanges",
                    tag
                )
            }
            RegistryError::UnknownAlternateExchange(name) => {
                write!(
                    f,
                    "Unknown alternate exchange while initialising mandatory exchange '{}' which should not have an alternate",
                    name
                )
            }
            RegistryError::Store { exchange, source } => {
                write!(f, "Failed to persist exchange '{}': {}", exchange, source)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}
