//! Broker configuration

/// Broker topology configuration
///
/// Covers only what this core needs: which virtual hosts exist and which
/// one, if any, serves clients that open a connection without naming a
/// virtual host. File/XML parsing belongs to the layer above.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Virtual host names to create at startup
    pub virtual_hosts: Vec<String>,

    /// Virtual host used when a client specifies none
    pub default_virtual_host: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            virtual_hosts: vec!["default".to_string()],
            default_virtual_host: Some("default".to_string()),
        }
    }
}

impl BrokerConfig {
    /// Create an empty configuration (no virtual hosts)
    pub fn empty() -> Self {
        Self {
            virtual_hosts: Vec::new(),
            default_virtual_host: None,
        }
    }

    /// Add a virtual host
    pub fn virtual_host(mut self, name: impl Into<String>) -> Self {
        self.virtual_hosts.push(name.into());
        self
    }

    /// Set the default virtual host
    pub fn default_virtual_host(mut self, name: impl Into<String>) -> Self {
        self.default_virtual_host = Some(name.into());
        self
    }
}
