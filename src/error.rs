//! Crate-level error types
//!
//! Lookup misses are never errors in this crate; probing for an entity that
//! may not exist is a routine operation and is expressed as `Option`.
//! The variants here cover the failures that actually abort an operation:
//! handshake rejection and registry/bootstrap faults.

use crate::exchange::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// AMQP reply code for "not found" (AMQP 0-9-1 constant 404)
pub const NOT_FOUND_CODE: u16 = 404;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Connection-open handshake failure (connection-fatal, never retried)
    Handshake(HandshakeError),
    /// Exchange registry failure (authorization or bootstrap)
    Registry(RegistryError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Handshake(e) => write!(f, "Handshake error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Handshake(e) => Some(e),
            Error::Registry(e) => Some(e),
        }
    }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self {
        Error::Handshake(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

/// Connection-open handshake failure
///
/// Any variant aborts the open transition: the connection stays in
/// `AwaitingOpen` and must be closed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Requested virtual host does not exist in the broker's directory
    UnknownVirtualHost(String),
    /// Client named no virtual host and no default is configured
    NoDefaultVirtualHost,
}

impl HandshakeError {
    /// Protocol reply code to send back to the client
    pub fn reply_code(&self) -> u16 {
        match self {
            HandshakeError::UnknownVirtualHost(_) => NOT_FOUND_CODE,
            HandshakeError::NoDefaultVirtualHost => NOT_FOUND_CODE,
        }
    }
}

impl std::fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandshakeError::UnknownVirtualHost(name) => {
                write!(f, "Unknown virtual host: '{}'", name)
            }
            HandshakeError::NoDefaultVirtualHost => {
                f.write_str("No virtual host specified and no default virtual host is configured")
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_virtual_host_carries_name() {
        let err = HandshakeError::UnknownVirtualHost("reports".to_string());
        assert!(err.to_string().contains("reports"));
        assert_eq!(err.reply_code(), NOT_FOUND_CODE);
    }

    #[test]
    fn test_no_default_vhost_distinct_from_empty_name() {
        let explicit = HandshakeError::UnknownVirtualHost(String::new());
        let unspecified = HandshakeError::NoDefaultVirtualHost;
        assert_ne!(explicit, unspecified);
        assert_ne!(explicit.to_string(), unspecified.to_string());
        assert_eq!(unspecified.reply_code(), NOT_FOUND_CODE);
    }

    #[test]
    fn test_error_wraps_handshake() {
        let err: Error = HandshakeError::UnknownVirtualHost("x".to_string()).into();
        assert!(matches!(err, Error::Handshake(_)));
        assert!(err.to_string().contains("Handshake"));
    }
}
